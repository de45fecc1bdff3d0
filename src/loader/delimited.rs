use crate::loader::infer::ColumnKind;
use crate::loader::{unique_headers, LoadOptions, ParseError};
use crate::table::Value;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::debug;
use std::borrow::Cow;

/// Decodes raw bytes to text: BOM first, then UTF-8, then Windows-1252.
pub(super) fn decode(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        debug!("Decoding delimited text as {} (BOM)", encoding.name());
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text;
    }
    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text,
        None => {
            debug!("Input is not valid UTF-8, decoding as {}", WINDOWS_1252.name());
            WINDOWS_1252.decode_without_bom_handling(bytes).0
        }
    }
}

/// Parses comma-separated bytes into column names and rows. The first record is the header.
pub(super) fn read_csv(
    bytes: &[u8],
    options: &LoadOptions,
) -> Result<(Vec<String>, Vec<Vec<Value>>), ParseError> {
    let text = decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ParseError::MissingHeaderRow),
    };
    let columns = unique_headers(header.iter().map(|name| Some(name.to_owned())));

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in records {
        let record = record?;
        if record.len() > columns.len() {
            return Err(ParseError::TooManyFields {
                line: record.position().map(|position| position.line()).unwrap_or_default(),
                expected: columns.len(),
                found: record.len(),
            });
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|field| Some(field.to_owned()).filter(|field| !field.is_empty()))
            .collect();
        row.resize(columns.len(), None);
        raw_rows.push(row);
    }

    let kinds: Vec<ColumnKind> = if options.preserve_format {
        vec![ColumnKind::Text; columns.len()]
    } else {
        (0..columns.len())
            .map(|index| ColumnKind::detect(raw_rows.iter().filter_map(|row| row[index].as_deref())))
            .collect()
    };
    debug!(
        "Detected column kinds: {:?}",
        columns
            .iter()
            .zip(&kinds)
            .map(|(column, kind)| format!("{}={}", column, kind.as_str()))
            .collect::<Vec<_>>()
    );

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(field, kind)| match field {
                    Some(field) => kind.parse(&field),
                    None => Value::Null,
                })
                .collect()
        })
        .collect();
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_handles_bom_and_legacy_bytes() {
        assert_eq!(decode(b"\xEF\xBB\xBFid,name"), "id,name");
        assert_eq!(decode(b"caf\xE9"), "café");
        assert_eq!(decode("naïve".as_bytes()), "naïve");
    }

    #[test]
    fn short_rows_are_padded() {
        let options = LoadOptions::default();
        let (columns, rows) = read_csv(b"id,name,city\n1,x\n", &options).unwrap();
        assert_eq!(columns, vec!["id", "name", "city"]);
        assert_eq!(rows, vec![vec![Value::from("1"), Value::from("x"), Value::Null]]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let options = LoadOptions::default();
        let error = read_csv(b"id,name\n1,x\n2,y,extra\n", &options).unwrap_err();
        assert!(matches!(
            error,
            ParseError::TooManyFields {
                line: 3,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn types_are_inferred_without_preserve_format() {
        let options = LoadOptions {
            preserve_format: false,
            ..LoadOptions::default()
        };
        let (_, rows) = read_csv(b"id,code,flag\n1,007,true\n2,x9,FALSE\n", &options).unwrap();
        assert_eq!(
            rows[0],
            vec![Value::from(1), Value::from("007"), Value::from(true)]
        );
        assert_eq!(rows[1][1], Value::from("x9"));
    }

    #[test]
    fn empty_input_has_no_header() {
        let result = read_csv(b"", &LoadOptions::default());
        assert!(matches!(result, Err(ParseError::MissingHeaderRow)));
    }
}
