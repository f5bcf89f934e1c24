use derive_setters::Setters;
use tracing::{debug, info, warn};

use crate::compose::{RenderModel, compose};
use crate::error::ConfigError;
use crate::resize::{self, ResizeDirection, ResizeState};
use crate::rows::{DEFAULT_PARALLEL_THRESHOLD, Record, RowHandle, RowModel, RowStore, SortedRowModel};
use crate::schema::{ColumnSchema, ColumnSpec};
use crate::sort::{self, SortClickMode, SortEntry, SortState};
use crate::visibility::{self, VisibilityState};

/// Table wide behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Setters)]
#[setters(strip_option)]
pub struct TableOptions {
    pub click_mode: SortClickMode,
    /// Upper width bound for columns that don't set their own.
    pub default_max_width: Option<f64>,
    pub resize_direction: ResizeDirection,
    /// Row count from which the stock row model sorts in parallel.
    pub parallel_threshold: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            click_mode: SortClickMode::default(),
            default_max_width: None,
            resize_direction: ResizeDirection::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// One table instance: schema, rows, the three view states and the render
/// model derived from them.
///
/// The render model is recomputed whenever a mutator changes a state, and
/// only then. Reading it is free.
pub struct Table<M: RowModel = SortedRowModel> {
    schema: ColumnSchema,
    store: RowStore,
    row_model: M,
    options: TableOptions,
    sort: SortState,
    visibility: VisibilityState,
    resize: ResizeState,
    order: Vec<RowHandle>,
    render_model: RenderModel,
}

impl Table<SortedRowModel> {
    pub fn new(
        records: &[Record],
        columns: Vec<ColumnSpec>,
        initial_sort: Vec<SortEntry>,
    ) -> Result<Self, ConfigError> {
        Self::with_options(records, columns, initial_sort, TableOptions::default())
    }

    pub fn with_options(
        records: &[Record],
        columns: Vec<ColumnSpec>,
        initial_sort: Vec<SortEntry>,
        options: TableOptions,
    ) -> Result<Self, ConfigError> {
        let schema = Self::build_schema(columns, &options)?;
        let store = RowStore::from_records(&schema, records);
        Self::assemble(schema, store, initial_sort, options)
    }

    /// Builds a table from column oriented data, one `Vec` per column in
    /// `columns` order.
    pub fn from_columns(
        columns: Vec<ColumnSpec>,
        data: Vec<Vec<String>>,
        initial_sort: Vec<SortEntry>,
        options: TableOptions,
    ) -> Result<Self, ConfigError> {
        let schema = Self::build_schema(columns, &options)?;
        let store = RowStore::from_columns(&schema, data)?;
        Self::assemble(schema, store, initial_sort, options)
    }

    fn build_schema(
        columns: Vec<ColumnSpec>,
        options: &TableOptions,
    ) -> Result<ColumnSchema, ConfigError> {
        let columns = match options.default_max_width {
            Some(max) => columns
                .into_iter()
                .map(|c| {
                    if c.max_width.is_infinite() {
                        let bound = max.max(c.min_width);
                        c.max_width(bound)
                    } else {
                        c
                    }
                })
                .collect(),
            None => columns,
        };
        ColumnSchema::new(columns)
    }

    fn assemble(
        schema: ColumnSchema,
        store: RowStore,
        initial_sort: Vec<SortEntry>,
        options: TableOptions,
    ) -> Result<Self, ConfigError> {
        let sort = SortState::new(initial_sort, &schema)?;
        let resize = ResizeState::new(&schema).with_direction(options.resize_direction);
        let row_model = SortedRowModel::new(options.parallel_threshold);
        let order = checked_order(&row_model, &store, &schema, &sort);
        info!(
            "Created table with {} columns and {} rows",
            schema.len(),
            store.len()
        );

        let mut table = Self {
            schema,
            store,
            row_model,
            options,
            sort,
            visibility: VisibilityState::default(),
            resize,
            order,
            render_model: RenderModel::default(),
        };
        table.recompose();
        Ok(table)
    }
}

impl<M: RowModel> Table<M> {
    /// Swaps the row model and reorders the rows with it.
    pub fn with_row_model<N: RowModel>(self, row_model: N) -> Table<N> {
        let order = checked_order(&row_model, &self.store, &self.schema, &self.sort);
        let mut table = Table {
            schema: self.schema,
            store: self.store,
            row_model,
            options: self.options,
            sort: self.sort,
            visibility: self.visibility,
            resize: self.resize,
            order,
            render_model: RenderModel::default(),
        };
        table.recompose();
        table
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn visibility_state(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn resize_state(&self) -> &ResizeState {
        &self.resize
    }

    pub fn render_model(&self) -> &RenderModel {
        &self.render_model
    }

    /// Row handles in display order.
    pub fn order(&self) -> &[RowHandle] {
        &self.order
    }

    pub fn row_count(&self) -> usize {
        self.store.len()
    }

    pub fn cell(&self, row: RowHandle, column_id: &str) -> Option<&str> {
        self.store.cell(row, column_id, &self.schema)
    }

    /// Header click. `modified_click` marks a multi-key click (e.g. with
    /// shift held). Returns whether the sort state changed.
    pub fn toggle_sort(&mut self, column_id: &str, modified_click: bool) -> bool {
        let multi_key = self.options.click_mode.is_multi_key(modified_click);
        let next = sort::toggle_sort(&self.sort, column_id, &self.schema, multi_key);
        if next == self.sort {
            return false;
        }
        self.sort = next;
        self.order = checked_order(&self.row_model, &self.store, &self.schema, &self.sort);
        self.recompose();
        true
    }

    pub fn toggle_column(&mut self, column_id: &str) -> bool {
        let next = visibility::toggle_column(&self.visibility, column_id, &self.schema);
        self.replace_visibility(next)
    }

    pub fn toggle_all(&mut self) -> bool {
        let next = visibility::toggle_all(&self.visibility, &self.schema);
        self.replace_visibility(next)
    }

    pub fn begin_resize(&mut self, column_id: &str, pointer_x: f64) -> bool {
        let next = resize::begin_resize(&self.resize, column_id, pointer_x);
        self.replace_resize(next)
    }

    pub fn update_resize(&mut self, pointer_x: f64) -> bool {
        let next = resize::update_resize(&self.resize, pointer_x);
        self.replace_resize(next)
    }

    pub fn end_resize(&mut self) -> bool {
        let next = resize::end_resize(&self.resize);
        self.replace_resize(next)
    }

    pub fn reset_width(&mut self, column_id: &str) -> bool {
        let next = resize::reset_width(&self.resize, column_id, &self.schema);
        self.replace_resize(next)
    }

    fn replace_visibility(&mut self, next: VisibilityState) -> bool {
        if next == self.visibility {
            return false;
        }
        self.visibility = next;
        self.recompose();
        true
    }

    fn replace_resize(&mut self, next: ResizeState) -> bool {
        if next == self.resize {
            return false;
        }
        self.resize = next;
        self.recompose();
        true
    }

    fn recompose(&mut self) {
        self.render_model = compose(
            &self.order,
            &self.store,
            &self.schema,
            &self.visibility,
            &self.resize,
            &self.sort,
        );
        debug!(
            "Render model: {} columns, {} rows, width {}",
            self.render_model.columns.len(),
            self.render_model.rows.len(),
            self.render_model.total_width
        );
    }
}

/// Runs the row model and drops handles that don't address a stored row.
fn checked_order<M: RowModel>(
    row_model: &M,
    store: &RowStore,
    schema: &ColumnSchema,
    sort: &SortState,
) -> Vec<RowHandle> {
    let mut order = row_model.order(store, schema, sort);
    let before = order.len();
    order.retain(|&row| row < store.len());
    if order.len() != before {
        warn!(
            "Row model returned {} handles outside of {} rows, dropped them",
            before - order.len(),
            store.len()
        );
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::{SortDirection, SortIndicator};

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("name").can_hide(false),
            ColumnSpec::new("size").min_width(10.0).initial_width(40.0),
        ]
    }

    fn records() -> Vec<Record> {
        vec![
            Record::from([("name", "b"), ("size", "2")]),
            Record::from([("name", "a"), ("size", "3")]),
            Record::from([("name", "c"), ("size", "1")]),
        ]
    }

    #[test]
    fn rejects_unknown_initial_sort_column() {
        let err = Table::new(&records(), columns(), vec![SortEntry::asc("weight")]).err();
        assert_eq!(err, Some(ConfigError::UnknownSortColumn("weight".into())));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let mut cols = columns();
        cols.push(ColumnSpec::new("name"));
        let err = Table::new(&records(), cols, vec![]).err();
        assert_eq!(err, Some(ConfigError::DuplicateColumnId("name".into())));
    }

    #[test]
    fn applies_initial_sort() {
        let table = Table::new(&records(), columns(), vec![SortEntry::asc("name")]).unwrap();
        assert_eq!(table.order(), &[1, 0, 2]);
        assert_eq!(table.render_model().rows[0].cells, ["a", "3"]);
    }

    #[test]
    fn sort_click_reorders_rows() {
        let mut table = Table::new(&records(), columns(), vec![]).unwrap();
        assert!(table.toggle_sort("size", false));
        assert_eq!(table.order(), &[2, 0, 1]);
        assert_eq!(table.render_model().columns[1].sort, SortIndicator::Ascending);
    }

    #[test]
    fn no_op_mutators_report_no_change() {
        let mut table = Table::new(&records(), columns(), vec![]).unwrap();
        let before = table.render_model().clone();
        assert!(!table.toggle_column("name"));
        assert!(!table.toggle_sort("missing", false));
        assert!(!table.update_resize(99.0));
        assert_eq!(table.render_model(), &before);
    }

    #[test]
    fn accumulate_mode_keeps_existing_keys() {
        let options = TableOptions::default().click_mode(SortClickMode::Accumulate);
        let mut table =
            Table::with_options(&records(), columns(), vec![SortEntry::asc("name")], options)
                .unwrap();
        table.toggle_sort("size", false);
        assert_eq!(table.sort_state().len(), 2);
        assert_eq!(table.sort_state().direction_of("size"), Some(SortDirection::Ascending));
    }

    #[test]
    fn default_max_width_caps_unbounded_columns() {
        let options = TableOptions::default().default_max_width(50.0);
        let mut table = Table::with_options(&records(), columns(), vec![], options).unwrap();
        assert_eq!(table.schema().get("size").map(|c| c.max_width), Some(50.0));
        table.begin_resize("size", 0.0);
        table.update_resize(1000.0);
        table.end_resize();
        assert_eq!(table.resize_state().width("size"), Some(50.0));
        assert_eq!(table.render_model().columns[1].width, 50.0);
    }

    #[test]
    fn hiding_and_resizing_update_render_model() {
        let mut table = Table::new(&records(), columns(), vec![]).unwrap();
        assert!(table.begin_resize("size", 100.0));
        assert!(table.update_resize(90.0));
        assert!(table.render_model().columns[1].is_resizing);
        assert_eq!(table.render_model().columns[1].width, 30.0);
        assert!(table.end_resize());
        assert!(table.toggle_column("size"));
        assert_eq!(table.render_model().columns.len(), 1);
        assert_eq!(table.render_model().rows[0].cells, ["b"]);
        assert!(table.reset_width("size"));
        assert_eq!(table.resize_state().width("size"), Some(40.0));
    }

    struct Reversed;

    impl RowModel for Reversed {
        fn order(&self, rows: &RowStore, _: &ColumnSchema, _: &SortState) -> Vec<RowHandle> {
            (0..rows.len()).rev().collect()
        }
    }

    #[test]
    fn custom_row_model_drives_order() {
        let table = Table::new(&records(), columns(), vec![]).unwrap().with_row_model(Reversed);
        assert_eq!(table.order(), &[2, 1, 0]);
        let names: Vec<&str> = table
            .order()
            .iter()
            .filter_map(|&r| table.cell(r, "name"))
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    struct Stale;

    impl RowModel for Stale {
        fn order(&self, rows: &RowStore, _: &ColumnSchema, _: &SortState) -> Vec<RowHandle> {
            vec![rows.len(), 0, rows.len() + 7]
        }
    }

    #[test]
    fn out_of_range_handles_are_dropped() {
        let mut table = Table::new(&records(), columns(), vec![]).unwrap().with_row_model(Stale);
        assert_eq!(table.order(), &[0]);
        assert_eq!(table.render_model().rows.len(), 1);
        assert_eq!(table.render_model().rows[0].cells, ["b", "2"]);

        assert!(table.toggle_sort("name", false));
        assert_eq!(table.order(), &[0]);
    }
}
