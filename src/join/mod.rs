//! # Join Engine
//!
//! Combines two tables on positionally paired key columns. Matching is a
//! hash join: the rows of each side are indexed by their key tuple and the
//! driving side is probed row by row, so output order follows the driving
//! side and, within a key group, the order of the probed side.
//!
//! Null key cells never match anything, including other nulls.
use crate::config::ConfigError;
use crate::join::key::{build_index, keys_of};
use crate::table::{Table, ValidationError, Value};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::str::FromStr;

pub(crate) mod key;
mod stats;

pub use stats::JoinStats;

/// Default suffixes appended to colliding column names.
pub const DEFAULT_SUFFIXES: (&str, &str) = ("_A", "_B");

/// Relational join variants.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Only rows whose keys match on both sides
    #[default]
    Inner,
    /// Every row of A plus matches from B
    Left,
    /// Every row of B plus matches from A
    Right,
    /// Every row of both sides
    Outer,
    /// Rows of A whose key is absent from B
    #[serde(rename = "anti_a_not_b", alias = "anti A vs B", alias = "anti_A_vs_B")]
    AntiANotB,
    /// Rows of B whose key is absent from A
    #[serde(rename = "anti_b_not_a", alias = "anti B vs A", alias = "anti_B_vs_A")]
    AntiBNotA,
}

impl JoinMode {
    /// All modes in menu order.
    pub const ALL: [JoinMode; 6] = [
        JoinMode::Inner,
        JoinMode::Left,
        JoinMode::Right,
        JoinMode::Outer,
        JoinMode::AntiANotB,
        JoinMode::AntiBNotA,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinMode::Inner => "inner",
            JoinMode::Left => "left",
            JoinMode::Right => "right",
            JoinMode::Outer => "outer",
            JoinMode::AntiANotB => "anti_a_not_b",
            JoinMode::AntiBNotA => "anti_b_not_a",
        }
    }

    /// One-line explanation shown when choosing a mode.
    pub const fn describe(&self) -> &'static str {
        match self {
            JoinMode::Inner => "Only rows that match in both tables",
            JoinMode::Left => "All rows of A plus matches from B",
            JoinMode::Right => "All rows of B plus matches from A",
            JoinMode::Outer => "All rows of both tables",
            JoinMode::AntiANotB => "Rows of A that are NOT in B",
            JoinMode::AntiBNotA => "Rows of B that are NOT in A",
        }
    }

    pub const fn is_anti(&self) -> bool {
        matches!(self, JoinMode::AntiANotB | JoinMode::AntiBNotA)
    }
}

impl Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JoinMode {
    type Err = ConfigError;

    /// Parses a mode name. Accepts the canonical names plus the labels used
    /// in saved configurations, e.g. "anti A vs B".
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "inner" => Ok(JoinMode::Inner),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            "outer" | "full" | "full_outer" => Ok(JoinMode::Outer),
            "anti_a_not_b" | "anti_a_vs_b" | "anti_a" => Ok(JoinMode::AntiANotB),
            "anti_b_not_a" | "anti_b_vs_a" | "anti_b" => Ok(JoinMode::AntiBNotA),
            _ => Err(ConfigError::UnknownJoinMode(name.to_owned())),
        }
    }
}

/// Which keys to compare and how to combine the two tables.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinSpec {
    /// Key columns of table A
    pub keys_a: Vec<String>,
    /// Key columns of table B, paired with `keys_a` by position
    pub keys_b: Vec<String>,
    /// Join variant
    pub mode: JoinMode,
    /// Suffixes for colliding non-key column names of A and B
    pub suffixes: (String, String),
}

impl JoinSpec {
    pub fn new<S: Into<String>>(
        keys_a: impl IntoIterator<Item = S>,
        keys_b: impl IntoIterator<Item = S>,
        mode: JoinMode,
    ) -> Self {
        JoinSpec {
            keys_a: keys_a.into_iter().map(Into::into).collect(),
            keys_b: keys_b.into_iter().map(Into::into).collect(),
            mode,
            suffixes: (DEFAULT_SUFFIXES.0.to_owned(), DEFAULT_SUFFIXES.1.to_owned()),
        }
    }

    pub fn with_suffixes(mut self, suffix_a: &str, suffix_b: &str) -> Self {
        self.suffixes = (suffix_a.to_owned(), suffix_b.to_owned());
        self
    }
}

/// Output of a join: the combined table plus match statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinResult {
    pub table: Table,
    pub stats: JoinStats,
}

/// Where an output column takes its value from.
#[derive(Copy, Clone, Debug)]
enum Source {
    A(usize),
    B(usize),
    /// Key pair with the same name on both sides, emitted once
    Key { a: usize, b: usize },
}

/// Output columns of a join and the source of each.
struct Layout {
    columns: Vec<String>,
    sources: Vec<Source>,
}

impl Layout {
    /// A's columns then B's remaining columns, suffixing shared names.
    fn combined(
        a: &Table,
        b: &Table,
        pairs: &[(usize, usize)],
        suffixes: &(String, String),
    ) -> Result<Layout, ValidationError> {
        let coalesced: HashMap<usize, usize> = pairs
            .iter()
            .filter(|(index_a, index_b)| a.columns()[*index_a] == b.columns()[*index_b])
            .copied()
            .collect();
        let coalesced_b: HashSet<usize> = coalesced.values().copied().collect();
        let kept_b: Vec<usize> = (0..b.column_count())
            .filter(|index| !coalesced_b.contains(index))
            .collect();

        let names_a: HashSet<&str> = a.columns().iter().map(String::as_str).collect();
        let names_b: HashSet<&str> = kept_b.iter().map(|index| b.columns()[*index].as_str()).collect();

        let mut columns = Vec::with_capacity(a.column_count() + kept_b.len());
        let mut sources = Vec::with_capacity(columns.capacity());
        for (index, name) in a.columns().iter().enumerate() {
            match coalesced.get(&index) {
                Some(&index_b) => {
                    columns.push(name.to_owned());
                    sources.push(Source::Key { a: index, b: index_b });
                }
                None if names_b.contains(name.as_str()) => {
                    columns.push(format!("{}{}", name, suffixes.0));
                    sources.push(Source::A(index));
                }
                None => {
                    columns.push(name.to_owned());
                    sources.push(Source::A(index));
                }
            }
        }
        for index in kept_b {
            let name = &b.columns()[index];
            if names_a.contains(name.as_str()) {
                columns.push(format!("{}{}", name, suffixes.1));
            } else {
                columns.push(name.to_owned());
            }
            sources.push(Source::B(index));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(duplicate) = columns.iter().find(|column| !seen.insert(column.as_str())) {
            return Err(ValidationError::DuplicateColumn {
                column: duplicate.to_owned(),
            });
        }
        Ok(Layout { columns, sources })
    }

    /// Builds one output row; coalesced keys prefer B's value when `prefer_b` is set.
    fn merge(&self, row_a: Option<&[Value]>, row_b: Option<&[Value]>, prefer_b: bool) -> Vec<Value> {
        self.sources
            .iter()
            .map(|source| match *source {
                Source::A(index) => row_a.map(|row| row[index].clone()).unwrap_or_default(),
                Source::B(index) => row_b.map(|row| row[index].clone()).unwrap_or_default(),
                Source::Key { a, b } => {
                    let value_a = row_a.map(|row| &row[a]).filter(|value| !value.is_null());
                    let value_b = row_b.map(|row| &row[b]).filter(|value| !value.is_null());
                    let value = if prefer_b {
                        value_b.or(value_a)
                    } else {
                        value_a.or(value_b)
                    };
                    value.cloned().unwrap_or_default()
                }
            })
            .collect()
    }
}

/// Resolves key names to positional (A, B) column index pairs.
fn resolve_keys(a: &Table, b: &Table, spec: &JoinSpec) -> Result<Vec<(usize, usize)>, ValidationError> {
    if spec.keys_a.is_empty() {
        return Err(ValidationError::EmptyKeys { side: "A".to_owned() });
    }
    if spec.keys_b.is_empty() {
        return Err(ValidationError::EmptyKeys { side: "B".to_owned() });
    }
    if spec.keys_a.len() != spec.keys_b.len() {
        return Err(ValidationError::KeyCountMismatch {
            left: spec.keys_a.len(),
            right: spec.keys_b.len(),
        });
    }
    let indexes_a = spec
        .keys_a
        .iter()
        .map(|key| a.require_column(key, "table A"))
        .collect::<Result<Vec<_>, _>>()?;
    let indexes_b = spec
        .keys_b
        .iter()
        .map(|key| b.require_column(key, "table B"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(indexes_a.into_iter().zip(indexes_b).collect())
}

/// Joins table A with table B.
///
/// # Errors
///
/// Returns a [`ValidationError`] when a key list is empty, the key lists differ
/// in length, a key column is missing, or suffixing still leaves duplicate
/// output column names.
pub fn join(a: &Table, b: &Table, spec: &JoinSpec) -> Result<JoinResult, ValidationError> {
    let pairs = resolve_keys(a, b, spec)?;
    let (indexes_a, indexes_b): (Vec<usize>, Vec<usize>) = pairs.iter().copied().unzip();
    debug!(
        "Join {} on {:?} = {:?} ({} x {} rows)",
        spec.mode,
        spec.keys_a,
        spec.keys_b,
        a.row_count(),
        b.row_count()
    );

    let keys_a = keys_of(a.rows(), &indexes_a);
    let keys_b = keys_of(b.rows(), &indexes_b);
    let index_a = build_index(&keys_a);
    let index_b = build_index(&keys_b);

    let mut matched = 0;
    let table = match spec.mode {
        JoinMode::AntiANotB => {
            let rows = a
                .rows()
                .iter()
                .zip(&keys_a)
                .filter(|(_, key)| key.as_ref().map(|key| !index_b.contains_key(key)).unwrap_or(true))
                .map(|(row, _)| row.clone())
                .collect();
            Table::new(a.columns().to_vec(), rows)?
        }
        JoinMode::AntiBNotA => {
            let rows = b
                .rows()
                .iter()
                .zip(&keys_b)
                .filter(|(_, key)| key.as_ref().map(|key| !index_a.contains_key(key)).unwrap_or(true))
                .map(|(row, _)| row.clone())
                .collect();
            Table::new(b.columns().to_vec(), rows)?
        }
        JoinMode::Right => {
            let layout = Layout::combined(a, b, &pairs, &spec.suffixes)?;
            let mut rows = Vec::with_capacity(b.row_count());
            for (row_b, key) in b.rows().iter().zip(&keys_b) {
                match key.as_ref().and_then(|key| index_a.get(key)) {
                    Some(hits) => {
                        for &hit in hits {
                            rows.push(layout.merge(Some(&a.rows()[hit]), Some(row_b), true));
                            matched += 1;
                        }
                    }
                    None => rows.push(layout.merge(None, Some(row_b), true)),
                }
            }
            Table::new(layout.columns, rows)?
        }
        JoinMode::Inner | JoinMode::Left | JoinMode::Outer => {
            let layout = Layout::combined(a, b, &pairs, &spec.suffixes)?;
            let mut rows = Vec::with_capacity(a.row_count());
            for (row_a, key) in a.rows().iter().zip(&keys_a) {
                match key.as_ref().and_then(|key| index_b.get(key)) {
                    Some(hits) => {
                        for &hit in hits {
                            rows.push(layout.merge(Some(row_a), Some(&b.rows()[hit]), false));
                            matched += 1;
                        }
                    }
                    None if spec.mode != JoinMode::Inner => {
                        rows.push(layout.merge(Some(row_a), None, false));
                    }
                    None => (),
                }
            }
            if spec.mode == JoinMode::Outer {
                for (row_b, key) in b.rows().iter().zip(&keys_b) {
                    let is_matched = key.as_ref().map(|key| index_a.contains_key(key)).unwrap_or(false);
                    if !is_matched {
                        rows.push(layout.merge(None, Some(row_b), false));
                    }
                }
            }
            Table::new(layout.columns, rows)?
        }
    };

    let stats = JoinStats::compute(&keys_a, &keys_b, &index_a, &index_b, matched, table.row_count());
    info!(
        "Join {} produced {} rows ({} matched, {} unmatched in A, {} unmatched in B)",
        spec.mode, stats.rows_result, stats.matched, stats.unmatched_a, stats.unmatched_b
    );
    Ok(JoinResult { table, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::new(columns.iter().map(|column| column.to_string()).collect(), rows).unwrap()
    }

    fn table_a() -> Table {
        table(
            &["id", "name"],
            vec![
                vec![Value::from(1), Value::from("x")],
                vec![Value::from(2), Value::from("y")],
            ],
        )
    }

    fn table_b() -> Table {
        table(
            &["id", "val"],
            vec![
                vec![Value::from(2), Value::from("p")],
                vec![Value::from(3), Value::from("q")],
            ],
        )
    }

    fn spec(mode: JoinMode) -> JoinSpec {
        JoinSpec::new(["id"], ["id"], mode)
    }

    #[test]
    fn inner_join_keeps_matching_pairs() {
        let result = join(&table_a(), &table_b(), &spec(JoinMode::Inner)).unwrap();
        assert_eq!(
            result.table,
            table(
                &["id", "name", "val"],
                vec![vec![Value::from(2), Value::from("y"), Value::from("p")]]
            )
        );
        assert_eq!(result.stats.matched, 1);
    }

    #[test]
    fn outer_join_coalesces_keys() {
        let result = join(&table_a(), &table_b(), &spec(JoinMode::Outer)).unwrap();
        assert_eq!(
            result.table,
            table(
                &["id", "name", "val"],
                vec![
                    vec![Value::from(1), Value::from("x"), Value::Null],
                    vec![Value::from(2), Value::from("y"), Value::from("p")],
                    vec![Value::from(3), Value::Null, Value::from("q")],
                ]
            )
        );
    }

    #[test]
    fn left_and_right_joins_pad_missing_side() {
        let left = join(&table_a(), &table_b(), &spec(JoinMode::Left)).unwrap();
        assert_eq!(left.table.row_count(), 2);
        assert_eq!(left.table.get(0, "val"), Some(&Value::Null));

        let right = join(&table_a(), &table_b(), &spec(JoinMode::Right)).unwrap();
        assert_eq!(
            right.table,
            table(
                &["id", "name", "val"],
                vec![
                    vec![Value::from(2), Value::from("y"), Value::from("p")],
                    vec![Value::from(3), Value::Null, Value::from("q")],
                ]
            )
        );
    }

    #[test]
    fn anti_joins_keep_one_side_columns() {
        let anti_a = join(&table_a(), &table_b(), &spec(JoinMode::AntiANotB)).unwrap();
        assert_eq!(
            anti_a.table,
            table(&["id", "name"], vec![vec![Value::from(1), Value::from("x")]])
        );
        assert_eq!(anti_a.stats.matched, 0);

        let anti_b = join(&table_a(), &table_b(), &spec(JoinMode::AntiBNotA)).unwrap();
        assert_eq!(
            anti_b.table,
            table(&["id", "val"], vec![vec![Value::from(3), Value::from("q")]])
        );
    }

    #[test]
    fn shared_non_key_columns_are_suffixed() {
        let a = table(&["id", "x"], vec![vec![Value::from(1), Value::from("a")]]);
        let b = table(&["id", "x"], vec![vec![Value::from(1), Value::from("b")]]);
        let result = join(&a, &b, &spec(JoinMode::Inner)).unwrap();
        assert_eq!(result.table.columns(), &["id", "x_A", "x_B"]);

        let custom = join(&a, &b, &spec(JoinMode::Inner).with_suffixes("_left", "_right")).unwrap();
        assert_eq!(custom.table.columns(), &["id", "x_left", "x_right"]);
    }

    #[test]
    fn differently_named_keys_keep_both_columns() {
        let a = table(&["customer", "name"], vec![vec![Value::from(7), Value::from("x")]]);
        let b = table(&["id", "total"], vec![vec![Value::from(7), Value::from(9.5)]]);
        let result = join(&a, &b, &JoinSpec::new(["customer"], ["id"], JoinMode::Inner)).unwrap();
        assert_eq!(result.table.columns(), &["customer", "name", "id", "total"]);
        assert_eq!(result.table.get(0, "total"), Some(&Value::from(9.5)));
    }

    #[test]
    fn compound_keys_fan_out_within_groups() {
        let a = table(
            &["k1", "k2", "a"],
            vec![
                vec![Value::from("x"), Value::from(1), Value::from("a1")],
                vec![Value::from("x"), Value::from(1), Value::from("a2")],
                vec![Value::from("x"), Value::from(2), Value::from("a3")],
            ],
        );
        let b = table(
            &["k1", "k2", "b"],
            vec![
                vec![Value::from("x"), Value::from(1), Value::from("b1")],
                vec![Value::from("x"), Value::from(1), Value::from("b2")],
            ],
        );
        let result = join(&a, &b, &JoinSpec::new(["k1", "k2"], ["k1", "k2"], JoinMode::Inner)).unwrap();
        assert_eq!(result.table.row_count(), 4);
        let pairs: Vec<(String, String)> = result
            .table
            .rows()
            .iter()
            .map(|row| (row[2].to_string(), row[3].to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a1".to_owned(), "b1".to_owned()),
                ("a1".to_owned(), "b2".to_owned()),
                ("a2".to_owned(), "b1".to_owned()),
                ("a2".to_owned(), "b2".to_owned()),
            ]
        );
        assert_eq!(result.stats.unique_keys_a, 2);
        assert_eq!(result.stats.unique_keys_b, 1);
        assert_eq!(result.stats.keys_matched, 1);
        assert_eq!(result.stats.unmatched_a, 1);
    }

    #[test]
    fn null_keys_never_match() {
        let a = table(&["id", "a"], vec![vec![Value::Null, Value::from("a")]]);
        let b = table(&["id", "b"], vec![vec![Value::Null, Value::from("b")]]);
        let inner = join(&a, &b, &spec(JoinMode::Inner)).unwrap();
        assert!(inner.table.is_empty());
        assert_eq!(inner.stats.unmatched_a, 1);
        assert_eq!(inner.stats.unmatched_b, 1);
        assert_eq!(inner.stats.unique_keys_a, 0);

        let outer = join(&a, &b, &spec(JoinMode::Outer)).unwrap();
        assert_eq!(outer.table.row_count(), 2);
        let anti = join(&a, &b, &spec(JoinMode::AntiANotB)).unwrap();
        assert_eq!(anti.table.row_count(), 1);
    }

    #[test]
    fn missing_key_column_is_named() {
        let error = join(
            &table_a(),
            &table_b(),
            &JoinSpec::new(["missing_col"], ["id"], JoinMode::Inner),
        )
        .unwrap_err();
        assert_eq!(
            error,
            ValidationError::MissingColumn {
                column: "missing_col".to_owned(),
                table: "table A".to_owned()
            }
        );
        assert!(error.to_string().contains("missing_col"));
    }

    #[test]
    fn key_lists_must_be_present_and_paired() {
        let empty = JoinSpec::new(Vec::<String>::new(), vec!["id".to_owned()], JoinMode::Inner);
        assert_eq!(
            join(&table_a(), &table_b(), &empty),
            Err(ValidationError::EmptyKeys { side: "A".to_owned() })
        );
        let uneven = JoinSpec::new(["id", "name"], ["id"], JoinMode::Inner);
        assert_eq!(
            join(&table_a(), &table_b(), &uneven),
            Err(ValidationError::KeyCountMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn row_count_properties_hold() {
        let a = table(
            &["id", "v"],
            (0..20).map(|i| vec![Value::from(i % 7), Value::from(i)]).collect(),
        );
        let b = table(
            &["id", "w"],
            (0..15).map(|i| vec![Value::from(i % 5), Value::from(i)]).collect(),
        );
        let left = join(&a, &b, &spec(JoinMode::Left)).unwrap();
        assert!(left.table.row_count() >= a.row_count());

        let inner = join(&a, &b, &spec(JoinMode::Inner)).unwrap();
        for row in inner.table.rows() {
            let key = &row[0];
            assert!(a.column_values(0).any(|value| value == key));
            assert!(b.column_values(0).any(|value| value == key));
        }

        let anti = join(&a, &b, &spec(JoinMode::AntiANotB)).unwrap();
        let with_match = a.row_count() - inner.stats.unmatched_a;
        assert_eq!(anti.table.row_count() + with_match, a.row_count());
        assert_eq!(anti.table.row_count(), anti.stats.unmatched_a);
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("anti A vs B".parse::<JoinMode>().unwrap(), JoinMode::AntiANotB);
        assert_eq!("Anti-B-Not-A".parse::<JoinMode>().unwrap(), JoinMode::AntiBNotA);
        assert_eq!("OUTER".parse::<JoinMode>().unwrap(), JoinMode::Outer);
        assert!("sideways".parse::<JoinMode>().is_err());
        for mode in JoinMode::ALL {
            assert_eq!(mode.as_str().parse::<JoinMode>().unwrap(), mode);
        }
    }
}
