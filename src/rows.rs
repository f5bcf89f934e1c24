use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::error::ConfigError;
use crate::schema::{ColumnSchema, ColumnSpec};
use crate::sort::{SortDirection, SortState};

/// Index of a row in its [`RowStore`].
pub type RowHandle = usize;

/// Row count from which [`SortedRowModel`] sorts on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// A single input row, keyed by column id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(column_id.into(), value.into());
        self
    }

    pub fn get(&self, column_id: &str) -> Option<&str> {
        self.values.get(column_id).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Record {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Column oriented cell storage, one `Vec` per schema column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStore {
    columns: Vec<Vec<String>>,
    len: usize,
}

impl RowStore {
    /// Missing values become empty cells.
    pub fn from_records(schema: &ColumnSchema, records: &[Record]) -> Self {
        let columns = schema
            .columns()
            .iter()
            .map(|c| {
                records
                    .iter()
                    .map(|r| r.get(&c.id).unwrap_or_default().to_string())
                    .collect()
            })
            .collect();
        Self {
            columns,
            len: records.len(),
        }
    }

    /// Takes ready-made columns, in schema order, of equal length.
    pub fn from_columns(
        schema: &ColumnSchema,
        columns: Vec<Vec<String>>,
    ) -> Result<Self, ConfigError> {
        if columns.len() != schema.len() {
            return Err(ConfigError::ColumnCountMismatch {
                expected: schema.len(),
                found: columns.len(),
            });
        }
        let len = columns.first().map(Vec::len).unwrap_or(0);
        for (spec, data) in schema.columns().iter().zip(columns.iter()) {
            if data.len() != len {
                return Err(ConfigError::RaggedColumn {
                    id: spec.id.clone(),
                    expected: len,
                    found: data.len(),
                });
            }
        }
        Ok(Self { columns, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value at `row` in the column at schema position `column`.
    pub fn value(&self, row: RowHandle, column: usize) -> &str {
        &self.columns[column][row]
    }

    pub fn cell(&self, row: RowHandle, column_id: &str, schema: &ColumnSchema) -> Option<&str> {
        let column = schema.position(column_id)?;
        self.columns.get(column)?.get(row).map(String::as_str)
    }
}

/// Produces the display order of the rows for a sort state.
///
/// Implementations must sort stably: rows that tie on every sort key keep
/// their store order.
pub trait RowModel {
    fn order(&self, rows: &RowStore, schema: &ColumnSchema, sort: &SortState) -> Vec<RowHandle>;
}

/// Stable multi-key sort using each column's comparator.
#[derive(Debug, Clone, Copy)]
pub struct SortedRowModel {
    parallel_threshold: usize,
}

impl SortedRowModel {
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }
}

impl Default for SortedRowModel {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl RowModel for SortedRowModel {
    fn order(&self, rows: &RowStore, schema: &ColumnSchema, sort: &SortState) -> Vec<RowHandle> {
        let mut handles: Vec<RowHandle> = (0..rows.len()).collect();

        let keys: Vec<(usize, &ColumnSpec, SortDirection)> = sort
            .iter()
            .filter_map(|entry| {
                let idx = schema.position(&entry.column_id)?;
                Some((idx, &schema.columns()[idx], entry.direction))
            })
            .collect();
        if keys.is_empty() {
            return handles;
        }

        let start_time = Instant::now();
        let compare = |a: &RowHandle, b: &RowHandle| {
            keys.iter()
                .map(|(idx, spec, direction)| {
                    direction.apply(spec.compare(rows.value(*a, *idx), rows.value(*b, *idx)))
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        };

        // Both sorts are stable.
        if handles.len() >= self.parallel_threshold {
            handles.par_sort_by(compare);
        } else {
            handles.sort_by(compare);
        }

        debug!(
            "Sorted {} rows by {} keys in {}ms",
            handles.len(),
            keys.len(),
            start_time.elapsed().as_millis()
        );
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, numeric_compare};
    use crate::sort::SortEntry;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            ColumnSpec::new("name"),
            ColumnSpec::new("price").comparator(numeric_compare),
            ColumnSpec::new("group"),
        ])
        .unwrap()
    }

    fn store(schema: &ColumnSchema) -> RowStore {
        RowStore::from_records(
            schema,
            &[
                Record::from([("name", "Apple"), ("price", "10"), ("group", "b")]),
                Record::from([("name", "Banana"), ("price", "5"), ("group", "a")]),
                Record::from([("name", "Cherry"), ("price", "15"), ("group", "b")]),
                Record::from([("name", "Date"), ("price", "5"), ("group", "a")]),
            ],
        )
    }

    fn names(store: &RowStore, order: &[RowHandle]) -> Vec<String> {
        order.iter().map(|&r| store.value(r, 0).to_string()).collect()
    }

    #[test]
    fn empty_sort_keeps_store_order() {
        let schema = schema();
        let store = store(&schema);
        let order = SortedRowModel::default().order(&store, &schema, &SortState::default());
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn sorts_numerically_with_comparator() {
        let schema = schema();
        let store = store(&schema);
        let sort = SortState::new(vec![SortEntry::asc("price")], &schema).unwrap();
        let order = SortedRowModel::default().order(&store, &schema, &sort);
        // Banana and Date tie on price and keep their store order.
        assert_eq!(names(&store, &order), ["Banana", "Date", "Apple", "Cherry"]);
    }

    #[test]
    fn later_keys_break_ties() {
        let schema = schema();
        let store = store(&schema);
        let sort = SortState::new(vec![SortEntry::asc("group"), SortEntry::desc("price")], &schema)
            .unwrap();
        let order = SortedRowModel::default().order(&store, &schema, &sort);
        assert_eq!(names(&store, &order), ["Banana", "Date", "Cherry", "Apple"]);
    }

    #[test]
    fn parallel_sort_matches_sequential() {
        let schema = schema();
        let store = store(&schema);
        let sort = SortState::new(vec![SortEntry::desc("group"), SortEntry::asc("price")], &schema)
            .unwrap();
        let sequential = SortedRowModel::default().order(&store, &schema, &sort);
        let parallel = SortedRowModel::new(0).order(&store, &schema, &sort);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn missing_record_values_are_empty() {
        let schema = schema();
        let store = RowStore::from_records(&schema, &[Record::new().with("name", "Fig")]);
        assert_eq!(store.cell(0, "price", &schema), Some(""));
        assert_eq!(store.cell(0, "unknown", &schema), None);
    }

    #[test]
    fn rejects_ragged_columns() {
        let schema = schema();
        let err = RowStore::from_columns(
            &schema,
            vec![vec!["a".into()], vec!["1".into(), "2".into()], vec!["x".into()]],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::RaggedColumn { .. }));

        let err = RowStore::from_columns(&schema, vec![vec![]]).unwrap_err();
        assert_eq!(err, ConfigError::ColumnCountMismatch { expected: 3, found: 1 });
    }
}
