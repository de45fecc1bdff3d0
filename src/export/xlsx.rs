use crate::error::RustyMergeError;
use crate::helpers::excel_date::to_serial;
use crate::helpers::reference::{cell_position, column_name};
use crate::helpers::xml::XmlWriter;
use crate::helpers::zip::ZipHelper;
use crate::table::{format_number, Table, Value};
use chrono::Timelike;
use std::io::Cursor;
use zip::ZipWriter;

/// Worksheet name of the exported workbook.
pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// cellXfs: 0 general, 1 date (built-in format 14), 2 date-time (built-in format 22)
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

const DATE_STYLE: &str = "1";
const DATETIME_STYLE: &str = "2";

fn workbook_xml() -> Result<Vec<u8>, RustyMergeError> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "workbook",
        &[
            ("xmlns", "http://schemas.openxmlformats.org/spreadsheetml/2006/main"),
            ("xmlns:r", "http://schemas.openxmlformats.org/officeDocument/2006/relationships"),
        ],
    )?;
    xml.start("sheets", &[])?;
    xml.empty("sheet", &[("name", SHEET_NAME), ("sheetId", "1"), ("r:id", "rId1")])?;
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml.into_bytes())
}

fn write_text_cell(xml: &mut XmlWriter, position: &str, text: &str) -> Result<(), RustyMergeError> {
    xml.start("c", &[("r", position), ("t", "inlineStr")])?;
    xml.start("is", &[])?;
    xml.element("t", &[("xml:space", "preserve")], text)?;
    xml.end("is")?;
    xml.end("c")
}

fn write_value_cell(xml: &mut XmlWriter, attributes: &[(&str, &str)], value: &str) -> Result<(), RustyMergeError> {
    xml.start("c", attributes)?;
    xml.element("v", &[], value)?;
    xml.end("c")
}

fn write_cell(xml: &mut XmlWriter, row: usize, column: usize, value: &Value) -> Result<(), RustyMergeError> {
    let position = cell_position(row, column);
    let position = position.as_str();
    match value {
        Value::Null => Ok(()),
        Value::Number(number) if number.is_finite() => write_value_cell(xml, &[("r", position)], &format_number(*number)),
        Value::Number(number) => write_text_cell(xml, position, &number.to_string()),
        Value::Bool(flag) => write_value_cell(xml, &[("r", position), ("t", "b")], if *flag { "1" } else { "0" }),
        Value::Text(text) => write_text_cell(xml, position, text),
        Value::DateTime(datetime) => {
            let style = if datetime.num_seconds_from_midnight() == 0 && datetime.nanosecond() == 0 {
                DATE_STYLE
            } else {
                DATETIME_STYLE
            };
            write_value_cell(xml, &[("r", position), ("s", style)], &to_serial(datetime).to_string())
        }
    }
}

fn sheet_xml(table: &Table) -> Result<Vec<u8>, RustyMergeError> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "worksheet",
        &[("xmlns", "http://schemas.openxmlformats.org/spreadsheetml/2006/main")],
    )?;
    let last_column = column_name(table.column_count().saturating_sub(1));
    let dimension = format!("A1:{}{}", last_column, table.row_count() + 1);
    xml.empty("dimension", &[("ref", dimension.as_str())])?;
    xml.start("sheetData", &[])?;

    let header_row = "1";
    xml.start("row", &[("r", header_row)])?;
    for (column, name) in table.columns().iter().enumerate() {
        write_text_cell(&mut xml, &cell_position(0, column), name)?;
    }
    xml.end("row")?;

    for (index, values) in table.rows().iter().enumerate() {
        let row = index + 1;
        let reference = (row + 1).to_string();
        xml.start("row", &[("r", reference.as_str())])?;
        if values.iter().all(Value::is_null) {
            // Readers drop rows without cells, an empty string keeps the row and loads as null
            write_text_cell(&mut xml, &cell_position(row, 0), "")?;
        }
        for (column, value) in values.iter().enumerate() {
            write_cell(&mut xml, row, column, value)?;
        }
        xml.end("row")?;
    }

    xml.end("sheetData")?;
    xml.end("worksheet")?;
    Ok(xml.into_bytes())
}

/// Serializes a table into a single-sheet workbook.
///
/// The header row holds the column names. Numbers become numeric cells,
/// booleans boolean cells, date-times serial numbers with a date or
/// date-time format, text inline strings; nulls are left out, except that a
/// row of nulls keeps one empty string cell. Archive entries carry a fixed
/// timestamp, so the same table always yields the same bytes.
pub fn to_xlsx_bytes(table: &Table) -> Result<Vec<u8>, RustyMergeError> {
    package(&sheet_xml(table)?)
}

/// Wraps a worksheet part into a complete workbook package.
fn package(sheet: &[u8]) -> Result<Vec<u8>, RustyMergeError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.write_part("[Content_Types].xml", CONTENT_TYPES.as_bytes())?;
    zip.write_part("_rels/.rels", ROOT_RELATIONSHIPS.as_bytes())?;
    zip.write_part("xl/workbook.xml", &workbook_xml()?)?;
    zip.write_part("xl/_rels/workbook.xml.rels", WORKBOOK_RELATIONSHIPS.as_bytes())?;
    zip.write_part("xl/styles.xml", STYLES.as_bytes())?;
    zip.write_part("xl/worksheets/sheet1.xml", sheet)?;
    Ok(zip.finish()?.into_inner())
}
