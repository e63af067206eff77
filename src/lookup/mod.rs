//! In-memory join indexes built from the raw source tables.
//!
//! Everything here is synchronous and runs to completion before the first
//! transform starts; transforms assume every index is fully populated.

pub mod catalog;
pub mod customers;
pub mod sales;

pub use catalog::CatalogLookups;
pub use customers::CustomerLookups;
pub use sales::SalesLookups;

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::RowError;
use crate::source::{parse_rows, SourceData, SourceRecord};

/// What to keep when two rows share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The source is append-only; the first row is authoritative.
    FirstWins,
    LastWins,
}

/// Build a 1:1 index.
pub fn index_by<T, K, V>(
    rows: impl IntoIterator<Item = T>,
    policy: DuplicatePolicy,
    key: impl Fn(&T) -> K,
    value: impl Fn(T) -> V,
) -> HashMap<K, V>
where
    K: Eq + Hash,
{
    let mut index = HashMap::new();
    for row in rows {
        let k = key(&row);
        match policy {
            DuplicatePolicy::FirstWins => {
                index.entry(k).or_insert_with(|| value(row));
            }
            DuplicatePolicy::LastWins => {
                index.insert(k, value(row));
            }
        }
    }
    index
}

/// Build a 1:many index. Children keep source order under each key.
pub fn group_by<T, K>(rows: impl IntoIterator<Item = T>, key: impl Fn(&T) -> K) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
{
    let mut groups: HashMap<K, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row)).or_default().push(row);
    }
    groups
}

/// Parse a lookup-only table, collecting its malformed rows.
fn parse_table<T: SourceRecord>(data: &SourceData, rejected: &mut Vec<RowError>) -> Vec<T> {
    let (parsed, errors) = parse_rows::<T>(data.rows(T::TABLE));
    for error in &errors {
        tracing::warn!(table = %T::TABLE, error = %error, "Rejected source row");
    }
    rejected.extend(errors);
    parsed
}

/// Parse a table whose rows are also a transform's primary input. The
/// transform reports malformed rows, so they are skipped silently here.
fn parse_primary<T: SourceRecord>(data: &SourceData) -> Vec<T> {
    parse_rows::<T>(data.rows(T::TABLE)).0
}

/// Every index the transforms need.
#[derive(Debug, Default)]
pub struct Lookups {
    pub catalog: CatalogLookups,
    pub customers: CustomerLookups,
    pub sales: SalesLookups,
}

impl Lookups {
    /// Returns the indexes and the rows rejected from lookup-only tables.
    pub fn build(data: &SourceData) -> (Self, Vec<RowError>) {
        let mut rejected = Vec::new();
        let lookups = Self {
            catalog: CatalogLookups::build(data, &mut rejected),
            customers: CustomerLookups::build(data, &mut rejected),
            sales: SalesLookups::build(data, &mut rejected),
        };
        (lookups, rejected)
    }
}
