//! Deterministic ordering of query files.
//!
//! Queries are ordered by base name (file name with its final extension removed):
//!
//! - when both base names parse as integers they compare numerically, so `2` sorts before `10`
//! - otherwise base names compare case-insensitively, with case-sensitive and full-path
//!   tie-breaks so that no two distinct paths compare equal
//!
//! A numeric name always sorts before a non-numeric one. Comparing a mixed pair by string
//! instead would make the relation intransitive (`9 < 10 < 1a < 9`), and sorting requires a
//! total order.

use std::cmp::Ordering;

use crate::core::file_ref::FileRef;

/// Sort key derived from a query file's name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NameKey {
    Numeric(i128),
    Text,
}

impl NameKey {
    fn of(base_name: &str) -> Self {
        base_name
            .parse::<i128>()
            .map_or(Self::Text, Self::Numeric)
    }
}

/// Compare two query files under the query ordering policy.
#[must_use]
pub fn compare_queries(a: &FileRef, b: &FileRef) -> Ordering {
    let base_a = a.base_name();
    let base_b = b.base_name();

    let primary = match (NameKey::of(&base_a), NameKey::of(&base_b)) {
        (NameKey::Numeric(x), NameKey::Numeric(y)) => x.cmp(&y),
        // Numbers first: comparing mixed pairs as strings cycles (9 < 10 < 10a < 9)
        (NameKey::Numeric(_), NameKey::Text) => Ordering::Less,
        (NameKey::Text, NameKey::Numeric(_)) => Ordering::Greater,
        (NameKey::Text, NameKey::Text) => Ordering::Equal,
    };

    primary
        .then_with(|| collate(&base_a, &base_b))
        .then_with(|| a.file_name().cmp(&b.file_name()))
        .then_with(|| a.path().cmp(b.path()))
}

/// Collation-style string comparison: case-insensitive first, then by code point.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort queries in place under the query ordering policy.
pub fn sort_queries(queries: &mut [FileRef]) {
    queries.sort_by(compare_queries);
}
