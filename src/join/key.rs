use crate::table::Value;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Hashable form of a non-null cell used for key comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum KeyPart {
    /// Bit pattern of a normalized, non-NaN number
    Number(u64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Ordered key values of one row.
pub(crate) type KeyTuple = Vec<KeyPart>;

impl KeyPart {
    /// Converts a cell to a key part. Nulls and NaN never take part in matches.
    pub(crate) fn from_value(value: &Value) -> Option<KeyPart> {
        match value {
            Value::Null => None,
            Value::Number(number) if number.is_nan() => None,
            // -0.0 and 0.0 are the same key
            Value::Number(number) => Some(KeyPart::Number((number + 0.0).to_bits())),
            Value::Text(text) => Some(KeyPart::Text(text.to_owned())),
            Value::Bool(value) => Some(KeyPart::Bool(*value)),
            Value::DateTime(datetime) => Some(KeyPart::DateTime(*datetime)),
        }
    }
}

/// Extracts the key tuple of a row, or None when any key cell is null.
pub(crate) fn key_of(row: &[Value], indexes: &[usize]) -> Option<KeyTuple> {
    indexes
        .iter()
        .map(|index| KeyPart::from_value(&row[*index]))
        .collect()
}

/// Key tuples of every row of a table.
pub(crate) fn keys_of(rows: &[Vec<Value>], indexes: &[usize]) -> Vec<Option<KeyTuple>> {
    rows.iter().map(|row| key_of(row, indexes)).collect()
}

/// Maps each non-null key tuple to the rows holding it, in row order.
pub(crate) fn build_index(keys: &[Option<KeyTuple>]) -> HashMap<&KeyTuple, Vec<usize>> {
    let mut index: HashMap<&KeyTuple, Vec<usize>> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key).or_default().push(row);
        }
    }
    index
}
