//! # Column Selector
//!
//! Narrows a table to a chosen list of columns. Row order and row count are
//! never changed.
use crate::table::{Table, ValidationError};
use std::collections::HashSet;

/// Keeps exactly the requested columns, in the requested order.
///
/// # Errors
///
/// Returns `MissingColumn` naming the first unknown column, or
/// `DuplicateColumn` when a name is requested twice.
pub fn select<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Table, ValidationError> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut indexes = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateColumn {
                column: name.to_owned(),
            });
        }
        indexes.push(table.require_column(name, "result table")?);
    }
    let columns = indexes
        .iter()
        .map(|index| table.columns()[*index].to_owned())
        .collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| indexes.iter().map(|index| row[*index].clone()).collect())
        .collect();
    Table::new(columns, rows)
}

/// Maps columns picked from each original table onto the joined table.
///
/// A name is looked up as-is first, then with its side's suffix (`x` from A
/// becomes `x_A` after a collision). Names found in neither form are skipped
/// and a name reached from both sides is kept once. When nothing resolves,
/// every column of the joined table is returned.
pub fn resolve_side_columns<S: AsRef<str>>(
    joined: &Table,
    columns_a: &[S],
    columns_b: &[S],
    suffixes: (&str, &str),
) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();
    let sides = [(columns_a, suffixes.0), (columns_b, suffixes.1)];
    for (names, suffix) in sides {
        for name in names {
            let name = name.as_ref();
            let candidate = if joined.column_index(name).is_some() {
                Some(name.to_owned())
            } else {
                let suffixed = format!("{}{}", name, suffix);
                joined.column_index(&suffixed).map(|_| suffixed)
            };
            if let Some(column) = candidate {
                if !resolved.contains(&column) {
                    resolved.push(column);
                }
            }
        }
    }
    if resolved.is_empty() {
        joined.columns().to_vec()
    } else {
        resolved
    }
}
