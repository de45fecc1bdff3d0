//! # Data Quality Helpers
//!
//! Checks that help the user pick keys and spot problems before joining:
//! per-column null statistics, key column suggestions, duplicate key
//! detection, a pre-join validation report and whitespace normalization.
use crate::join::key::{key_of, KeyTuple};
use crate::loader::ColumnKind;
use crate::table::{Table, ValidationError, Value};
use log::debug;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Null statistics and detected kind of one column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnQuality {
    pub name: String,
    pub kind: &'static str,
    pub null_count: usize,
    /// Share of null cells, 0 to 100
    pub null_percentage: f64,
}

/// Summary of a loaded table.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityReport {
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns: Vec<ColumnQuality>,
    /// Approximate in-memory size of the cells
    pub memory_usage_mb: f64,
}

impl QualityReport {
    /// Null count of a column by name.
    pub fn null_count(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|quality| quality.name == column)
            .map(|quality| quality.null_count)
    }

    /// Columns holding at least one null.
    pub fn columns_with_nulls(&self) -> impl Iterator<Item = &ColumnQuality> {
        self.columns.iter().filter(|quality| quality.null_count > 0)
    }
}

/// Computes row and column counts, nulls per column and approximate memory use.
pub fn analyze_data_quality(table: &Table) -> QualityReport {
    let total_rows = table.row_count();
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let null_count = table.column_values(index).filter(|value| value.is_null()).count();
            let null_percentage = if total_rows == 0 {
                0.0
            } else {
                null_count as f64 * 100.0 / total_rows as f64
            };
            ColumnQuality {
                name: name.to_owned(),
                kind: ColumnKind::of_values(table.column_values(index)).as_str(),
                null_count,
                null_percentage,
            }
        })
        .collect();
    let bytes: usize = table
        .rows()
        .iter()
        .flat_map(|row| row.iter())
        .map(Value::footprint)
        .sum::<usize>()
        + table.columns().iter().map(String::capacity).sum::<usize>();
    QualityReport {
        total_rows,
        total_columns: table.column_count(),
        columns,
        memory_usage_mb: bytes as f64 / (1024.0 * 1024.0),
    }
}

fn key_name_hint() -> &'static Regex {
    static HINT: OnceLock<Regex> = OnceLock::new();
    HINT.get_or_init(|| {
        Regex::new(r"(?i)(^id$|_id$|^id_|key|code|email)").expect("Hardcode pattern")
    })
}

/// Suggests key columns, most likely first.
///
/// Each column scores its share of distinct non-null values, minus its share
/// of nulls, plus a bonus when the name looks like an identifier (`id`,
/// `*_id`, `key`, `code`, `email`). Columns scoring below one half are left out.
pub fn detect_key_columns(table: &Table) -> Vec<String> {
    let rows = table.row_count();
    if rows == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(f64, usize)> = (0..table.column_count())
        .map(|index| {
            let parts: Vec<KeyTuple> = table
                .rows()
                .iter()
                .filter_map(|row| key_of(row, &[index]))
                .collect();
            let distinct: HashSet<&KeyTuple> = parts.iter().collect();
            let uniqueness = distinct.len() as f64 / rows as f64;
            let null_ratio = (rows - parts.len()) as f64 / rows as f64;
            let hint = if key_name_hint().is_match(&table.columns()[index]) { 0.5 } else { 0.0 };
            (uniqueness - null_ratio + hint, index)
        })
        .filter(|(score, _)| *score >= 0.5)
        .collect();
    scored.sort_by(|left, right| right.0.total_cmp(&left.0).then(left.1.cmp(&right.1)));
    debug!("Key column scores: {:?}", scored);
    scored
        .into_iter()
        .map(|(_, index)| table.columns()[index].to_owned())
        .collect()
}

/// Repeated key tuples in one table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    pub has_duplicates: bool,
    /// Rows whose key tuple appears more than once
    pub duplicate_count: usize,
    /// Distinct key tuples that repeat
    pub duplicate_keys: usize,
}

/// Counts rows taking part in repeated key groups. Rows with a null key are ignored.
pub fn detect_duplicates<S: AsRef<str>>(table: &Table, keys: &[S]) -> Result<DuplicateReport, ValidationError> {
    let indexes = keys
        .iter()
        .map(|key| table.require_column(key.as_ref(), "table"))
        .collect::<Result<Vec<_>, _>>()?;
    let mut groups: HashMap<KeyTuple, usize> = HashMap::new();
    for row in table.rows() {
        if let Some(key) = key_of(row, &indexes) {
            *groups.entry(key).or_default() += 1;
        }
    }
    let repeated: Vec<usize> = groups.into_values().filter(|count| *count > 1).collect();
    Ok(DuplicateReport {
        has_duplicates: !repeated.is_empty(),
        duplicate_count: repeated.iter().sum(),
        duplicate_keys: repeated.len(),
    })
}

/// Expected key overlap between two tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlapInfo {
    /// Distinct key tuples present in both tables
    pub overlap: usize,
    pub unique_a: usize,
    pub unique_b: usize,
}

/// Outcome of the checks run before a join.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    /// Problems that prevent the join
    pub errors: Vec<String>,
    /// Problems worth a look that do not prevent the join
    pub warnings: Vec<String>,
    /// Present when the keys could be compared
    pub info: Option<OverlapInfo>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks key selections against both tables and measures their overlap.
pub fn validate_before_merge<S: AsRef<str>>(a: &Table, b: &Table, keys_a: &[S], keys_b: &[S]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if keys_a.is_empty() || keys_b.is_empty() {
        report.errors.push("Select at least one key column for each table".to_owned());
    }
    if keys_a.len() != keys_b.len() {
        report.errors.push(
            ValidationError::KeyCountMismatch {
                left: keys_a.len(),
                right: keys_b.len(),
            }
            .to_string(),
        );
    }
    let mut resolve = |table: &Table, keys: &[S], label: &str| -> Vec<usize> {
        keys.iter()
            .filter_map(|key| match table.require_column(key.as_ref(), label) {
                Ok(index) => Some(index),
                Err(error) => {
                    report.errors.push(error.to_string());
                    None
                }
            })
            .collect()
    };
    let indexes_a = resolve(a, keys_a, "table A");
    let indexes_b = resolve(b, keys_b, "table B");
    if !report.errors.is_empty() {
        return report;
    }

    for (index_a, index_b) in indexes_a.iter().zip(&indexes_b) {
        let kind_a = ColumnKind::of_values(a.column_values(*index_a));
        let kind_b = ColumnKind::of_values(b.column_values(*index_b));
        if kind_a != kind_b {
            report.warnings.push(format!(
                "Key columns '{}' ({}) and '{}' ({}) hold different kinds of values",
                a.columns()[*index_a],
                kind_a.as_str(),
                b.columns()[*index_b],
                kind_b.as_str()
            ));
        }
    }

    let keys_of_a: Vec<Option<KeyTuple>> = a.rows().iter().map(|row| key_of(row, &indexes_a)).collect();
    let keys_of_b: Vec<Option<KeyTuple>> = b.rows().iter().map(|row| key_of(row, &indexes_b)).collect();
    for (label, keys) in [("A", &keys_of_a), ("B", &keys_of_b)] {
        let nulls = keys.iter().filter(|key| key.is_none()).count();
        if nulls > 0 {
            report.warnings.push(format!(
                "{} rows of table {} have empty key values and will not match",
                nulls, label
            ));
        }
    }

    let unique_a: HashSet<&KeyTuple> = keys_of_a.iter().flatten().collect();
    let unique_b: HashSet<&KeyTuple> = keys_of_b.iter().flatten().collect();
    for (label, keys, unique) in [("A", &keys_of_a, &unique_a), ("B", &keys_of_b, &unique_b)] {
        let non_null = keys.iter().flatten().count();
        if non_null > unique.len() {
            report.warnings.push(format!(
                "Table {} has repeated keys: {} rows share {} distinct keys; matches will multiply rows",
                label,
                non_null,
                unique.len()
            ));
        }
    }
    let overlap = unique_a.intersection(&unique_b).count();
    if overlap == 0 {
        report.warnings.push("No key value appears in both tables".to_owned());
    }
    report.info = Some(OverlapInfo {
        overlap,
        unique_a: unique_a.len(),
        unique_b: unique_b.len(),
    });
    report
}

/// Trims surrounding whitespace of text cells in the given columns (all
/// columns when none are given). Text left empty becomes null.
pub fn normalize<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Table, ValidationError> {
    let indexes: HashSet<usize> = if columns.is_empty() {
        (0..table.column_count()).collect()
    } else {
        columns
            .iter()
            .map(|column| table.require_column(column.as_ref(), "table"))
            .collect::<Result<_, _>>()?
    };
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(index, value)| match value {
                    Value::Text(text) if indexes.contains(&index) => {
                        let trimmed = text.trim();
                        if trimmed.is_empty() {
                            Value::Null
                        } else {
                            Value::Text(trimmed.to_owned())
                        }
                    }
                    other => other.clone(),
                })
                .collect()
        })
        .collect();
    Table::new(table.columns().to_vec(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::new(columns.iter().map(|column| column.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn detect_key_columns_ranks_identifiers_first() {
        let people = table(
            &["id", "name", "email", "other"],
            (0..5)
                .map(|index| {
                    vec![
                        Value::from(index + 1),
                        Value::from(format!("N{}", index)),
                        Value::from(format!("{}@test.com", index)),
                        Value::from(if index % 2 == 0 { "X" } else { "Y" }),
                    ]
                })
                .collect(),
        );
        let detected = detect_key_columns(&people);
        assert_eq!(detected, vec!["id", "email", "name"]);
    }

    #[test]
    fn validate_before_merge_reports_overlap() {
        let a = table(
            &["key", "value_a"],
            (1..=4).map(|key| vec![Value::from(key), Value::from("v")]).collect(),
        );
        let b = table(
            &["key", "value_b"],
            (2..=5).map(|key| vec![Value::from(key), Value::from("w")]).collect(),
        );
        let report = validate_before_merge(&a, &b, &["key"], &["key"]);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(
            report.info,
            Some(OverlapInfo {
                overlap: 3,
                unique_a: 4,
                unique_b: 4
            })
        );
    }

    #[test]
    fn validate_before_merge_reports_missing_columns() {
        let a = table(&["key"], vec![]);
        let report = validate_before_merge(&a, &a, &["nope"], &["key"]);
        assert!(!report.is_ok());
        assert!(report.errors[0].contains("nope"));
        assert_eq!(report.info, None);
    }

    #[test]
    fn validate_before_merge_warns_about_kinds_nulls_and_repeats() {
        let a = table(
            &["key"],
            vec![vec![Value::from(1)], vec![Value::from(1)], vec![Value::Null]],
        );
        let b = table(&["key"], vec![vec![Value::from("x")]]);
        let report = validate_before_merge(&a, &b, &["key"], &["key"]);
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 4);
        assert_eq!(report.info.map(|info| info.overlap), Some(0));
    }

    #[test]
    fn normalize_trims_selected_columns() {
        let raw = table(
            &["col1", "col2"],
            vec![
                vec![Value::from("  A  "), Value::from(" X ")],
                vec![Value::from("   "), Value::from(2)],
            ],
        );
        let normalized = normalize(&raw, &["col1"]).unwrap();
        assert_eq!(normalized.get(0, "col1"), Some(&Value::from("A")));
        assert_eq!(normalized.get(0, "col2"), Some(&Value::from(" X ")));
        assert_eq!(normalized.get(1, "col1"), Some(&Value::Null));

        let everything = normalize(&raw, &[] as &[&str]).unwrap();
        assert_eq!(everything.get(0, "col2"), Some(&Value::from("X")));
    }

    #[test]
    fn detect_duplicates_counts_rows_in_repeated_groups() {
        let keys = table(
            &["key", "value"],
            [1, 2, 2, 3, 3, 3]
                .into_iter()
                .map(|key| vec![Value::from(key), Value::from("v")])
                .collect(),
        );
        let report = detect_duplicates(&keys, &["key"]).unwrap();
        assert!(report.has_duplicates);
        assert_eq!(report.duplicate_count, 5);
        assert_eq!(report.duplicate_keys, 2);
    }

    #[test]
    fn analyze_data_quality_counts_nulls() {
        let data = table(
            &["col1", "col2", "col3"],
            vec![
                vec![Value::from(1), Value::from("A"), Value::from(10.5)],
                vec![Value::from(2), Value::from("B"), Value::from(20.3)],
                vec![Value::from(3), Value::Null, Value::from(30.1)],
                vec![Value::Null, Value::from("D"), Value::from(40.2)],
                vec![Value::from(5), Value::from("E"), Value::from(50.0)],
            ],
        );
        let quality = analyze_data_quality(&data);
        assert_eq!(quality.total_rows, 5);
        assert_eq!(quality.total_columns, 3);
        assert_eq!(quality.null_count("col1"), Some(1));
        assert_eq!(quality.null_count("col2"), Some(1));
        assert_eq!(quality.columns[0].null_percentage, 20.0);
        assert_eq!(quality.columns[2].kind, "number");
        assert_eq!(quality.columns_with_nulls().count(), 2);
        assert!(quality.memory_usage_mb > 0.0);
    }
}
