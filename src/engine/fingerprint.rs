// src/engine/fingerprint.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::value::Row;

/// Canonical encoding of an empty result set. Non-empty sets always encode
/// with at least one inner array, so this string is reserved.
const EMPTY_CANONICAL: &str = "[]";

/// Order- and alias-independent digest of a query result (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest shared by every result set with zero rows.
    pub fn empty() -> Self {
        Self(sha256_hex(EMPTY_CANONICAL))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(hex: String) -> Self {
        Self(hex)
    }
}

fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Builds the canonical signature list for a row set.
///
/// Column names are dropped, each row's values are stringified and sorted,
/// then the rows themselves are sorted. Two columns holding the same kind of
/// data can therefore be swapped without changing the result; that is the
/// price of alias tolerance.
pub fn canonical_rows(rows: &[Row]) -> Vec<Vec<String>> {
    let mut signatures: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut values: Vec<String> = row.values().map(|v| v.canonical_text().into_owned()).collect();
            values.sort();
            values
        })
        .collect();

    signatures.sort();
    signatures
}

/// Fingerprints a row set. Pure: the digest depends only on the multiset of
/// per-row value multisets.
pub fn fingerprint(rows: &[Row]) -> Fingerprint {
    if rows.is_empty() {
        return Fingerprint::empty();
    }

    // Vec<Vec<String>> has no map keys, so the JSON encoding is fully determined
    // by content and keeps the nesting unambiguous.
    let canonical = serde_json::to_string(&canonical_rows(rows)).unwrap_or_default();
    Fingerprint(sha256_hex(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::SqlValue;

    fn employee(name: &str, salary: i64) -> Row {
        Row::new()
            .with("name", SqlValue::Text(name.into()))
            .with("salary", SqlValue::Integer(salary))
    }

    fn staff() -> Vec<Row> {
        vec![employee("ann", 100), employee("bob", 200), employee("cy", 300)]
    }

    #[test]
    fn row_order_does_not_matter() {
        let mut shuffled = staff();
        shuffled.reverse();
        shuffled.swap(0, 1);

        assert_eq!(fingerprint(&staff()), fingerprint(&shuffled));
    }

    #[test]
    fn column_order_and_aliases_do_not_matter() {
        let aliased: Vec<Row> = staff()
            .iter()
            .map(|row| {
                Row::new()
                    .with("s", row.get("salary").cloned().unwrap())
                    .with("n", row.get("name").cloned().unwrap())
            })
            .collect();

        assert_eq!(fingerprint(&staff()), fingerprint(&aliased));
    }

    #[test]
    fn single_cell_change_alters_digest() {
        let mut changed = staff();
        changed[1] = employee("bob", 201);

        assert_ne!(fingerprint(&staff()), fingerprint(&changed));
    }

    #[test]
    fn row_multiplicity_matters() {
        let mut doubled = staff();
        doubled.push(employee("ann", 100));

        assert_ne!(fingerprint(&staff()), fingerprint(&doubled));
    }

    #[test]
    fn empty_result_uses_reserved_digest() {
        assert_eq!(fingerprint(&[]), Fingerprint::empty());
        assert_ne!(fingerprint(&[]), fingerprint(&staff()));

        // A single row of nulls is still a row.
        let nulls = vec![Row::new().with("x", SqlValue::Null)];
        assert_ne!(fingerprint(&[]), fingerprint(&nulls));
    }

    #[test]
    fn independently_built_results_hash_identically() {
        let first = fingerprint(&staff());
        let second = fingerprint(&staff());

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn swapped_same_typed_columns_are_indistinguishable() {
        // Known tradeoff: names are discarded, so swapping first/last name columns
        // produces the same per-row value multiset.
        let original = vec![
            Row::new()
                .with("first", SqlValue::Text("ada".into()))
                .with("last", SqlValue::Text("lovelace".into())),
        ];
        let swapped = vec![
            Row::new()
                .with("first", SqlValue::Text("lovelace".into()))
                .with("last", SqlValue::Text("ada".into())),
        ];

        assert_eq!(fingerprint(&original), fingerprint(&swapped));
    }

    #[test]
    fn canonical_rows_sorts_within_and_across_rows() {
        let rows = vec![employee("bob", 200), employee("ann", 100)];
        assert_eq!(
            canonical_rows(&rows),
            vec![
                vec!["100".to_string(), "ann".to_string()],
                vec!["200".to_string(), "bob".to_string()],
            ]
        );
    }
}
