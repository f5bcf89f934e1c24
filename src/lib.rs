//! View state engine for tables with sortable, hideable and resizable columns.
//!
//! The transition functions in [`sort`], [`visibility`] and [`resize`] are pure:
//! they take a state and return the next one. [`table::Table`] owns one set of
//! states, re-runs the [`rows::RowModel`] when the sort changes and rebuilds
//! the [`compose::RenderModel`] after every effective mutation.

pub mod compose;
pub mod error;
pub mod resize;
pub mod rows;
pub mod schema;
pub mod sort;
pub mod table;
pub mod visibility;

pub use compose::{ColumnView, RenderModel, RowView, VisibilityToggle, compose};
pub use error::ConfigError;
pub use resize::{ResizeDirection, ResizeSession, ResizeState};
pub use rows::{Record, RowHandle, RowModel, RowStore, SortedRowModel};
pub use schema::{ColumnSchema, ColumnSpec, Comparator, SortFirst, default_compare, numeric_compare};
pub use sort::{SortClickMode, SortDirection, SortEntry, SortHint, SortIndicator, SortState};
pub use table::{Table, TableOptions};
pub use visibility::VisibilityState;
