use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::schema::{ColumnSchema, SortFirst};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Orients an ascending comparison result to this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortEntry {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }

    pub fn asc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Ascending)
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Descending)
    }
}

/// What a header shows for its column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortIndicator {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortIndicator {
    pub fn symbol(self) -> &'static str {
        match self {
            SortIndicator::None => "",
            SortIndicator::Ascending => "▲",
            SortIndicator::Descending => "▼",
        }
    }
}

impl From<Option<SortDirection>> for SortIndicator {
    fn from(direction: Option<SortDirection>) -> Self {
        match direction {
            None => SortIndicator::None,
            Some(SortDirection::Ascending) => SortIndicator::Ascending,
            Some(SortDirection::Descending) => SortIndicator::Descending,
        }
    }
}

/// What the next click on a header would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortHint {
    Ascending,
    Descending,
    Clear,
}

impl SortHint {
    pub fn describe(self) -> &'static str {
        match self {
            SortHint::Ascending => "Sort ascending",
            SortHint::Descending => "Sort descending",
            SortHint::Clear => "Clear sort",
        }
    }
}

/// How a plain (unmodified) header click treats the other sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortClickMode {
    /// A plain click replaces the whole sort state with the clicked column.
    #[default]
    Collapse,
    /// Every click keeps the other keys, as if it were a multi-key click.
    Accumulate,
}

impl SortClickMode {
    pub fn is_multi_key(self, modified_click: bool) -> bool {
        modified_click || self == SortClickMode::Accumulate
    }
}

/// Prioritized sort keys, primary first. No column appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    entries: Vec<SortEntry>,
}

impl SortState {
    /// Builds a sort state checked against `schema`.
    pub fn new(entries: Vec<SortEntry>, schema: &ColumnSchema) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries.iter() {
            if schema.get(&entry.column_id).is_none() {
                return Err(ConfigError::UnknownSortColumn(entry.column_id.clone()));
            }
            if !seen.insert(entry.column_id.as_str()) {
                return Err(ConfigError::DuplicateSortColumn(entry.column_id.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SortEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortEntry> {
        self.entries.iter()
    }

    pub fn priority_of(&self, column_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.column_id == column_id)
    }

    pub fn direction_of(&self, column_id: &str) -> Option<SortDirection> {
        self.entries
            .iter()
            .find(|e| e.column_id == column_id)
            .map(|e| e.direction)
    }

    pub fn indicator(&self, column_id: &str) -> SortIndicator {
        self.direction_of(column_id).into()
    }
}

// unsorted -> first -> second -> unsorted
fn cycle(current: Option<SortDirection>, sort_first: SortFirst) -> Option<SortDirection> {
    match current {
        None => Some(sort_first.first()),
        Some(direction) if direction == sort_first.first() => Some(sort_first.second()),
        Some(_) => None,
    }
}

/// Returns the sort state after a click on `column_id`'s header.
///
/// Unknown columns and columns that cannot sort leave the state untouched.
/// With `multi_key` the other entries are kept, a new entry goes to the back
/// and a cleared entry is dropped in place. Without it the result holds at
/// most the clicked column.
pub fn toggle_sort(
    state: &SortState,
    column_id: &str,
    schema: &ColumnSchema,
    multi_key: bool,
) -> SortState {
    let Some(column) = schema.get(column_id).filter(|c| c.can_sort) else {
        trace!("Ignoring sort toggle on \"{column_id}\"");
        return state.clone();
    };

    let next = cycle(state.direction_of(column_id), column.sort_first);
    let entries = if multi_key {
        let mut entries = state.entries.clone();
        match (state.priority_of(column_id), next) {
            (Some(idx), Some(direction)) => entries[idx].direction = direction,
            (Some(idx), None) => {
                entries.remove(idx);
            }
            (None, Some(direction)) => entries.push(SortEntry::new(column_id, direction)),
            (None, None) => {}
        }
        entries
    } else {
        next.map(|direction| vec![SortEntry::new(column_id, direction)])
            .unwrap_or_default()
    };

    debug!(
        "Sort toggle on \"{}\" (multi: {}): {:?} -> {:?}",
        column_id, multi_key, state.entries, entries
    );
    SortState { entries }
}

/// Describes the transition the next click on `column_id` would cause.
pub fn next_sort_direction(
    state: &SortState,
    column_id: &str,
    schema: &ColumnSchema,
) -> Option<SortHint> {
    let column = schema.get(column_id).filter(|c| c.can_sort)?;
    Some(
        match cycle(state.direction_of(column_id), column.sort_first) {
            Some(SortDirection::Ascending) => SortHint::Ascending,
            Some(SortDirection::Descending) => SortHint::Descending,
            None => SortHint::Clear,
        },
    )
}
