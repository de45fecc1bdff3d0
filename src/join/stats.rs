use crate::join::key::KeyTuple;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// Descriptive counters computed after a join.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Rows in table A
    pub rows_a: usize,
    /// Rows in table B
    pub rows_b: usize,
    /// Distinct non-null key tuples in table A
    pub unique_keys_a: usize,
    /// Distinct non-null key tuples in table B
    pub unique_keys_b: usize,
    /// Output rows holding values from both sides
    pub matched: usize,
    /// Rows of A without any match in B
    pub unmatched_a: usize,
    /// Rows of B without any match in A
    pub unmatched_b: usize,
    /// Rows in the joined table
    pub rows_result: usize,
    /// Distinct key tuples present on both sides
    pub keys_matched: usize,
}

impl JoinStats {
    pub(super) fn compute(
        keys_a: &[Option<KeyTuple>],
        keys_b: &[Option<KeyTuple>],
        index_a: &HashMap<&KeyTuple, Vec<usize>>,
        index_b: &HashMap<&KeyTuple, Vec<usize>>,
        matched: usize,
        rows_result: usize,
    ) -> JoinStats {
        fn unmatched(keys: &[Option<KeyTuple>], other: &HashMap<&KeyTuple, Vec<usize>>) -> usize {
            keys.iter()
                .filter(|key| key.as_ref().map(|key| !other.contains_key(key)).unwrap_or(true))
                .count()
        }
        let unique_a: HashSet<&KeyTuple> = index_a.keys().copied().collect();
        let keys_matched = index_b.keys().filter(|key| unique_a.contains(*key)).count();
        JoinStats {
            rows_a: keys_a.len(),
            rows_b: keys_b.len(),
            unique_keys_a: index_a.len(),
            unique_keys_b: index_b.len(),
            matched,
            unmatched_a: unmatched(keys_a, index_b),
            unmatched_b: unmatched(keys_b, index_a),
            rows_result,
            keys_matched,
        }
    }
}

impl Display for JoinStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rows in A:          {}", self.rows_a)?;
        writeln!(f, "Rows in B:          {}", self.rows_b)?;
        writeln!(f, "Result rows:        {}", self.rows_result)?;
        writeln!(f, "Unique keys in A:   {}", self.unique_keys_a)?;
        writeln!(f, "Unique keys in B:   {}", self.unique_keys_b)?;
        writeln!(f, "Keys in A and B:    {}", self.keys_matched)?;
        writeln!(f, "Matched rows:       {}", self.matched)?;
        writeln!(f, "Unmatched rows (A): {}", self.unmatched_a)?;
        write!(f, "Unmatched rows (B): {}", self.unmatched_b)
    }
}
