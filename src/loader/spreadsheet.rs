//! Workbook reading on top of calamine for Excel 2007+ (.xlsx) and legacy
//! Excel (.xls) files held in memory.
use crate::error::RustyMergeError;
use crate::helpers::reference::cell_position;
use crate::loader::{unique_headers, FileFormat, FormatError, LoadOptions, ParseError};
use crate::table::Value;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use std::io::Cursor;

/// Type alias for an in-memory workbook reader
pub(crate) type ByteReader<'a> = Cursor<&'a [u8]>;

/// Wrapper enum for the supported workbook readers.
pub(crate) enum Spreadsheet<'a> {
    /// Excel 2007+ format reader (.xlsx)
    Xlsx(Xlsx<ByteReader<'a>>),
    /// Legacy Excel format reader (.xls)
    Xls(Xls<ByteReader<'a>>),
}

/// A single workbook cell with its absolute position.
#[derive(Debug)]
pub(crate) struct Cell<'a> {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) column: usize,
    /// The cell data read from the workbook
    pub(crate) value: &'a Data,
}

impl Cell<'_> {
    /// Get Excel-style cell position.
    pub(crate) fn get_position(&self) -> String {
        cell_position(self.row, self.column)
    }

    /// Converts the cell to a typed value.
    ///
    /// Error cells (`#N/A`, `#DIV/0!`, ...) and empty strings become nulls.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCellValue` when a date cell holds a serial outside the
    /// representable range.
    pub(crate) fn to_value(&self) -> Result<Value, ParseError> {
        let value = match self.value {
            Data::Empty | Data::Error(_) => Value::Null,
            Data::String(text) if text.is_empty() => Value::Null,
            Data::String(text) => Value::Text(text.to_owned()),
            Data::Int(number) => Value::Number(*number as f64),
            Data::Float(number) => Value::Number(*number),
            Data::Bool(value) => Value::Bool(*value),
            Data::DateTime(datetime) if datetime.is_duration() => Value::Number(datetime.as_f64()),
            Data::DateTime(datetime) => datetime
                .as_datetime()
                .map(Value::DateTime)
                .ok_or_else(|| ParseError::InvalidCellValue {
                    position: self.get_position(),
                    message: format!("serial {} is not a valid date", datetime.as_f64()),
                })?,
            Data::DateTimeIso(text) => parse_iso_datetime(text)
                .map(Value::DateTime)
                .unwrap_or_else(|| Value::Text(text.to_owned())),
            Data::DurationIso(text) => Value::Text(text.to_owned()),
        };
        Ok(value)
    }

    /// Converts the cell to the text a spreadsheet would display, or null.
    pub(crate) fn to_text(&self) -> Result<Value, ParseError> {
        let value = self.to_value()?;
        Ok(match value {
            Value::Null | Value::Text(_) => value,
            other => Value::Text(other.to_string()),
        })
    }
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl<'a> Spreadsheet<'a> {
    /// Opens an in-memory workbook with the reader matching its format.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Raw workbook content
    /// * `format` - Detected file format
    /// * `name` - File name used in error messages
    ///
    /// # Returns
    ///
    /// * `Result<Spreadsheet, RustyMergeError>` - The appropriate reader or error
    pub(crate) fn open(bytes: &'a [u8], format: FileFormat, name: &str) -> Result<Self, RustyMergeError> {
        match format {
            FileFormat::Xlsx => Ok(Self::Xlsx(
                Xlsx::new(Cursor::new(bytes)).map_err(ParseError::InvalidXlsxFileFormat)?,
            )),
            FileFormat::Xls => Ok(Self::Xls(
                Xls::new(Cursor::new(bytes)).map_err(ParseError::InvalidXlsFileFormat)?,
            )),
            FileFormat::Csv => Err(FormatError::NotAWorkbook {
                name: name.to_owned(),
            })?,
        }
    }

    /// Returns the names of all sheets in the workbook.
    pub(crate) fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(xlsx) => xlsx.sheet_names(),
            Self::Xls(xls) => xls.sheet_names(),
        }
    }

    /// Reads the used range of a sheet.
    fn range(&mut self, sheet_name: &str) -> Result<Range<Data>, ParseError> {
        match self {
            Self::Xlsx(xlsx) => Ok(xlsx.worksheet_range(sheet_name)?),
            Self::Xls(xls) => Ok(xls.worksheet_range(sheet_name)?),
        }
    }

    /// Reads a sheet into column names and rows. The first used row is the header.
    ///
    /// # Arguments
    ///
    /// * `options` - Load options; `sheet_name` picks the sheet (first sheet when unset)
    ///   and `preserve_format` turns every cell into its displayed text
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The specified sheet is not found or the workbook has no sheets
    /// - The sheet has no header row
    /// - A cell cannot be converted
    pub(crate) fn read_sheet(
        &mut self,
        options: &LoadOptions,
    ) -> Result<(Vec<String>, Vec<Vec<Value>>), ParseError> {
        let names = self.sheet_names();
        let sheet_name = match &options.sheet_name {
            Some(name) if names.contains(name) => name.to_owned(),
            Some(name) => return Err(ParseError::SheetNotFound { name: name.to_owned() }),
            None => names.first().cloned().ok_or(ParseError::SheetNotFound {
                name: "<first sheet>".to_owned(),
            })?,
        };
        debug!("Reading sheet '{}'", sheet_name);

        let range = self.range(&sheet_name)?;
        let (row_lower_bound, column_lower_bound) = match range.start() {
            Some((row, column)) if !range.is_empty() => (row as usize, column as usize),
            _ => return Err(ParseError::MissingHeaderRow),
        };

        let mut rows = range.rows().enumerate().map(|(offset, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(index, value)| Cell {
                    row: row_lower_bound + offset,
                    column: column_lower_bound + index,
                    value,
                })
                .collect::<Vec<Cell>>()
        });

        let header = rows.next().ok_or(ParseError::MissingHeaderRow)?;
        let header = header
            .iter()
            .map(|cell| cell.to_text().map(|value| value.as_text().map(str::to_owned)))
            .collect::<Result<Vec<_>, _>>()?;
        let columns = unique_headers(header);

        let mut data = Vec::new();
        for cells in rows {
            let mut row = cells
                .iter()
                .map(|cell| if options.preserve_format { cell.to_text() } else { cell.to_value() })
                .collect::<Result<Vec<_>, _>>()?;
            row.resize(columns.len(), Value::Null);
            data.push(row);
        }
        Ok((columns, data))
    }
}
