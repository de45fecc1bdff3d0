use crate::table::Value;
use chrono::{NaiveDate, NaiveDateTime};

/// Date-time layouts recognised in delimited text.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Enumeration of column kinds detected from cell contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Boolean values (true/false)
    Bool,
    /// Integer or floating point numbers
    Number,
    /// Date and date-time values
    DateTime,
    /// Text, also the fallback for mixed or empty columns
    Text,
}

impl ColumnKind {
    /// Returns the string representation of the column kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::DateTime => "datetime",
            Self::Text => "text",
        }
    }

    /// Infers the kind of a column from its raw text cells.
    ///
    /// Type inference priority (most to least specific):
    /// 1. Bool - if all values are booleans
    /// 2. Number - if all values are numbers
    /// 3. DateTime - if all values are dates or date-times
    /// 4. Text - fallback for mixed, textual or empty columns
    pub fn detect<'a>(values: impl IntoIterator<Item = &'a str>) -> ColumnKind {
        let values: Vec<&str> = values.into_iter().collect();
        if values.is_empty() {
            ColumnKind::Text
        } else if values.iter().all(|value| parse_bool(value).is_some()) {
            ColumnKind::Bool
        } else if values.iter().all(|value| parse_number(value).is_some()) {
            ColumnKind::Number
        } else if values.iter().all(|value| parse_datetime(value).is_some()) {
            ColumnKind::DateTime
        } else {
            ColumnKind::Text
        }
    }

    /// Infers the kind of a column of already typed cells, ignoring nulls.
    pub fn of_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnKind {
        let values: Vec<&Value> = values.into_iter().filter(|value| !value.is_null()).collect();
        if values.iter().all(|value| matches!(value, Value::Text(_))) {
            return ColumnKind::detect(values.iter().filter_map(|value| value.as_text()));
        }
        if values.iter().all(|value| matches!(value, Value::Bool(_))) {
            ColumnKind::Bool
        } else if values.iter().all(|value| matches!(value, Value::Number(_))) {
            ColumnKind::Number
        } else if values.iter().all(|value| matches!(value, Value::DateTime(_))) {
            ColumnKind::DateTime
        } else {
            ColumnKind::Text
        }
    }

    /// Converts a raw text cell into a value of this kind, keeping text on failure.
    pub(crate) fn parse(&self, raw: &str) -> Value {
        let parsed = match self {
            Self::Bool => parse_bool(raw).map(Value::Bool),
            Self::Number => parse_number(raw).map(Value::Number),
            Self::DateTime => parse_datetime(raw).map(Value::DateTime),
            Self::Text => None,
        };
        parsed.unwrap_or_else(|| Value::Text(raw.to_owned()))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    // Rejects words f64 accepts, such as "inf" or "NaN"
    if !raw.bytes().any(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
