use crate::error::RustyMergeError;
use crate::table::Table;

/// Serializes a table as comma-separated UTF-8 text with a header record.
/// Nulls become empty fields; other values are written as they display.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>, RustyMergeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| RustyMergeError::IoError(error.into_error()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn writes_header_and_quotes_fields() {
        let table = Table::new(
            vec!["id".into(), "note".into()],
            vec![
                vec![Value::from(1), Value::from("a, b")],
                vec![Value::from(2.5), Value::Null],
            ],
        )
        .unwrap();
        let text = String::from_utf8(to_csv_bytes(&table).unwrap()).unwrap();
        assert_eq!(text, "id,note\n1,\"a, b\"\n2.5,\n");
    }
}
