use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use derive_setters::Setters;

use crate::error::ConfigError;
use crate::sort::SortDirection;

pub const DEFAULT_MIN_WIDTH: f64 = 20.0;
pub const DEFAULT_WIDTH: f64 = 150.0;

/// Orders two cell values of the same column.
pub type Comparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Which direction a column reaches first when it goes from unsorted to sorted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortFirst {
    #[default]
    AscendingFirst,
    DescendingFirst,
}

impl SortFirst {
    pub fn first(self) -> SortDirection {
        match self {
            SortFirst::AscendingFirst => SortDirection::Ascending,
            SortFirst::DescendingFirst => SortDirection::Descending,
        }
    }

    pub fn second(self) -> SortDirection {
        self.first().reversed()
    }
}

/// Static description of a single column.
///
/// Built with the generated setters:
///
/// ```
/// use tvgrid::schema::{ColumnSpec, numeric_compare};
///
/// let price = ColumnSpec::new("price")
///     .label("Price")
///     .min_width(5.0)
///     .comparator(numeric_compare);
/// assert_eq!(price.label, "Price");
/// ```
#[derive(Clone, Setters)]
pub struct ColumnSpec {
    #[setters(skip)]
    pub id: String,
    #[setters(into)]
    pub label: String,
    pub can_hide: bool,
    pub can_sort: bool,
    #[setters(skip)]
    pub comparator: Option<Comparator>,
    pub sort_first: SortFirst,
    pub min_width: f64,
    pub max_width: f64,
    pub initial_width: f64,
}

impl ColumnSpec {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            can_hide: true,
            can_sort: true,
            comparator: None,
            sort_first: SortFirst::default(),
            min_width: DEFAULT_MIN_WIDTH,
            max_width: f64::INFINITY,
            initial_width: DEFAULT_WIDTH,
        }
    }

    pub fn comparator<F>(mut self, compare: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(compare));
        self
    }

    /// Compares two values with the column comparator, or [`default_compare`].
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.comparator {
            Some(compare) => compare(a, b),
            None => default_compare(a, b),
        }
    }

    pub fn clamp_width(&self, width: f64) -> f64 {
        width.max(self.min_width).min(self.max_width)
    }

    pub fn is_fixed_width(&self) -> bool {
        self.min_width >= self.max_width
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::EmptyColumnId);
        }
        if self.min_width.is_nan() || self.max_width.is_nan() || self.min_width > self.max_width {
            return Err(ConfigError::InvalidWidthBounds {
                id: self.id.clone(),
                min: self.min_width,
                max: self.max_width,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("can_hide", &self.can_hide)
            .field("can_sort", &self.can_sort)
            .field("comparator", &self.comparator.as_ref().map(|_| "custom"))
            .field("sort_first", &self.sort_first)
            .field("min_width", &self.min_width)
            .field("max_width", &self.max_width)
            .field("initial_width", &self.initial_width)
            .finish()
    }
}

/// Numeric when both values parse as numbers, lexical otherwise.
pub fn default_compare(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.total_cmp(&b_num),
        _ => a.cmp(b),
    }
}

/// Comparator for columns that hold numbers.
///
/// Values that parse come before values that don't; two unparsable values
/// fall back to string order.
pub fn numeric_compare(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.total_cmp(&b_num),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Validated, immutable list of columns.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    columns: Vec<ColumnSpec>,
    positions: HashMap<String, usize>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, ConfigError> {
        let mut positions = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            column.validate()?;
            if positions.insert(column.id.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateColumnId(column.id.clone()));
            }
        }
        Ok(Self { columns, positions })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ColumnSpec> {
        self.position(id).map(|idx| &self.columns[idx])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn hideable(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.can_hide)
    }
}
