use thiserror::Error;

/// Misconfiguration detected while building a table.
///
/// Interaction-time edge cases (clicking a header that cannot sort, toggling a
/// column that cannot hide, dragging a fixed-width column) are never errors,
/// they are plain no-ops.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("column id must not be empty")]
    EmptyColumnId,
    #[error("duplicate column id \"{0}\"")]
    DuplicateColumnId(String),
    #[error("column \"{id}\" has min width {min} larger than max width {max}")]
    InvalidWidthBounds { id: String, min: f64, max: f64 },
    #[error("sort entry references unknown column \"{0}\"")]
    UnknownSortColumn(String),
    #[error("column \"{0}\" appears more than once in the sort state")]
    DuplicateSortColumn(String),
    #[error("column \"{id}\" has {found} values, expected {expected}")]
    RaggedColumn {
        id: String,
        expected: usize,
        found: usize,
    },
    #[error("expected data for {expected} columns, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
}
