//! # Table Model
//!
//! In-memory tabular data shared by the loader, the join engine, the column
//! selector and the exporters. A [`Table`] owns an ordered list of unique
//! column names and an ordered list of rows; every row carries exactly one
//! [`Value`] per column, with missing data represented as [`Value::Null`].
use chrono::{NaiveDateTime, Timelike};
use std::collections::HashSet;
use std::fmt::Display;
use thiserror::Error;

/// Errors raised by input checks on tables, join keys and column selections.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A referenced column does not exist
    #[error("Column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    /// No key column was selected for one side
    #[error("No key columns selected for table {side}")]
    EmptyKeys { side: String },

    /// Key lists of both sides have different lengths
    #[error("Key column count differs: {left} in table A, {right} in table B")]
    KeyCountMismatch { left: usize, right: usize },

    /// A column name appears more than once
    #[error("Duplicate column name '{column}'")]
    DuplicateColumn { column: String },

    /// A row does not carry one value per column
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An input file exceeds the configured size limit
    #[error("File '{name}' is {size} bytes, larger than the {limit} bytes limit")]
    FileTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    /// A workflow step was invoked before its inputs exist
    #[error("{step} is not ready: {reason}")]
    StepNotReady { step: String, reason: String },
}

/// A single cell value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Missing value
    #[default]
    Null,
    /// Numeric value (integers are stored as whole floats)
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Date or date-time value
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true if the value is missing.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text content if the value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Approximate heap and inline footprint of the value in bytes.
    pub(crate) fn footprint(&self) -> usize {
        let inline = std::mem::size_of::<Value>();
        match self {
            Value::Text(text) => inline + text.capacity(),
            _ => inline,
        }
    }
}

/// Formats a number the way spreadsheets display it: whole numbers without a fraction.
pub(crate) fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(number) => write!(f, "{}", format_number(*number)),
            Value::Text(text) => write!(f, "{}", text),
            Value::Bool(value) => write!(f, "{}", value),
            Value::DateTime(datetime) => {
                if datetime.num_seconds_from_midnight() == 0 && datetime.nanosecond() == 0 {
                    write!(f, "{}", datetime.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// An ordered set of named columns and an ordered sequence of rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table, checking column uniqueness and row widths.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(ValidationError::DuplicateColumn {
                    column: column.to_owned(),
                });
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ValidationError::RowWidth {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Table { columns, rows })
    }

    /// Creates a table without rows.
    pub fn empty(columns: Vec<String>) -> Result<Self, ValidationError> {
        Self::new(columns, Vec::new())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Position of a column by name, failing with a validation error naming the column.
    pub fn require_column(&self, name: &str, table: &str) -> Result<usize, ValidationError> {
        self.column_index(name)
            .ok_or_else(|| ValidationError::MissingColumn {
                column: name.to_owned(),
                table: table.to_owned(),
            })
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Value at a row for a named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|row| &row[index])
    }

    /// The first `limit` rows.
    pub fn head(&self, limit: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(limit).cloned().collect(),
        }
    }

    /// Rows where any text cell contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Table {
        let needle = term.to_lowercase();
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.iter()
                    .filter_map(Value::as_text)
                    .any(|text| text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}
