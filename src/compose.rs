use crate::resize::ResizeState;
use crate::rows::{RowHandle, RowStore};
use crate::schema::ColumnSchema;
use crate::sort::{SortHint, SortIndicator, SortState, next_sort_direction};
use crate::visibility::VisibilityState;

/// A visible column as the host should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub id: String,
    pub label: String,
    pub width: f64,
    pub sort: SortIndicator,
    /// Position in the sort state, 0 is the primary key.
    pub sort_priority: Option<usize>,
    /// Effect of the next click on the header, `None` if it cannot sort.
    pub next_sort: Option<SortHint>,
    pub can_hide: bool,
    pub is_resizing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub handle: RowHandle,
    /// Cell values of the visible columns, in column order.
    pub cells: Vec<String>,
}

/// One entry of the column visibility panel.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityToggle {
    pub id: String,
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderModel {
    pub columns: Vec<ColumnView>,
    pub rows: Vec<RowView>,
    /// Sum of the visible column widths.
    pub total_width: f64,
    /// Hideable columns only, in schema order.
    pub toggles: Vec<VisibilityToggle>,
    pub all_visible: bool,
    pub sort_keys: usize,
}

/// Builds the render model from the current state. Pure and deterministic.
pub fn compose(
    ordered_rows: &[RowHandle],
    store: &RowStore,
    schema: &ColumnSchema,
    visibility: &VisibilityState,
    resize: &ResizeState,
    sort: &SortState,
) -> RenderModel {
    let visible: Vec<usize> = schema
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.can_hide || visibility.is_visible(&c.id))
        .map(|(idx, _)| idx)
        .collect();

    let columns: Vec<ColumnView> = visible
        .iter()
        .map(|&idx| {
            let spec = &schema.columns()[idx];
            ColumnView {
                id: spec.id.clone(),
                label: spec.label.clone(),
                width: resize
                    .width(&spec.id)
                    .unwrap_or_else(|| spec.clamp_width(spec.initial_width)),
                sort: sort.indicator(&spec.id),
                sort_priority: sort.priority_of(&spec.id),
                next_sort: next_sort_direction(sort, &spec.id, schema),
                can_hide: spec.can_hide,
                is_resizing: resize.is_resizing(&spec.id),
            }
        })
        .collect();

    // Handles past the end of the store have no row to show.
    let rows = ordered_rows
        .iter()
        .filter(|&&handle| handle < store.len())
        .map(|&handle| RowView {
            handle,
            cells: visible
                .iter()
                .map(|&idx| store.value(handle, idx).to_string())
                .collect(),
        })
        .collect();

    let toggles = schema
        .hideable()
        .map(|c| VisibilityToggle {
            id: c.id.clone(),
            label: c.label.clone(),
            visible: visibility.is_visible(&c.id),
        })
        .collect();

    RenderModel {
        total_width: columns.iter().map(|c| c.width).sum(),
        columns,
        rows,
        toggles,
        all_visible: visibility.all_visible(schema),
        sort_keys: sort.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::{begin_resize, update_resize};
    use crate::rows::Record;
    use crate::schema::ColumnSpec;
    use crate::sort::SortEntry;
    use crate::visibility::toggle_column;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            ColumnSpec::new("name").label("Name").can_hide(false).initial_width(100.0),
            ColumnSpec::new("price").label("Price").initial_width(60.0),
            ColumnSpec::new("note").label("Note").can_sort(false).initial_width(200.0),
        ])
        .unwrap()
    }

    fn store(schema: &ColumnSchema) -> RowStore {
        RowStore::from_records(
            schema,
            &[
                Record::from([("name", "Apple"), ("price", "10"), ("note", "fresh")]),
                Record::from([("name", "Banana"), ("price", "5"), ("note", "ripe")]),
            ],
        )
    }

    #[test]
    fn hidden_columns_are_dropped_from_columns_and_cells() {
        let schema = schema();
        let store = store(&schema);
        let visibility = toggle_column(&VisibilityState::default(), "price", &schema);
        let model = compose(
            &[1, 0],
            &store,
            &schema,
            &visibility,
            &ResizeState::new(&schema),
            &SortState::default(),
        );

        let ids: Vec<&str> = model.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["name", "note"]);
        assert_eq!(model.rows[0].handle, 1);
        assert_eq!(model.rows[0].cells, ["Banana", "ripe"]);
        assert_eq!(model.total_width, 300.0);
        assert!(!model.all_visible);
    }

    #[test]
    fn annotates_sort_and_width() {
        let schema = schema();
        let store = store(&schema);
        let sort = SortState::new(vec![SortEntry::desc("price"), SortEntry::asc("name")], &schema)
            .unwrap();
        let resize = update_resize(&begin_resize(&ResizeState::new(&schema), "price", 0.0), 15.0);
        let model = compose(
            &[0, 1],
            &store,
            &schema,
            &VisibilityState::default(),
            &resize,
            &sort,
        );

        let price = &model.columns[1];
        assert_eq!(price.sort, SortIndicator::Descending);
        assert_eq!(price.sort_priority, Some(0));
        assert_eq!(price.next_sort, Some(SortHint::Clear));
        assert_eq!(price.width, 75.0);
        assert!(price.is_resizing);

        let note = &model.columns[2];
        assert_eq!(note.sort, SortIndicator::None);
        assert_eq!(note.next_sort, None);
        assert_eq!(model.sort_keys, 2);
    }

    #[test]
    fn toggles_list_only_hideable_columns() {
        let schema = schema();
        let store = store(&schema);
        let model = compose(
            &[],
            &store,
            &schema,
            &VisibilityState::default(),
            &ResizeState::new(&schema),
            &SortState::default(),
        );
        let ids: Vec<&str> = model.toggles.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["price", "note"]);
        assert!(model.all_visible);
        assert!(model.rows.is_empty());
    }

    #[test]
    fn identical_inputs_give_identical_models() {
        let schema = schema();
        let store = store(&schema);
        let sort = SortState::new(vec![SortEntry::asc("name")], &schema).unwrap();
        let visibility = toggle_column(&VisibilityState::default(), "note", &schema);
        let resize = ResizeState::new(&schema);
        let first = compose(&[0, 1], &store, &schema, &visibility, &resize, &sort);
        let second = compose(&[0, 1], &store, &schema, &visibility, &resize, &sort);
        assert_eq!(first, second);
    }

    #[test]
    fn skips_handles_outside_the_store() {
        let schema = schema();
        let store = store(&schema);
        let model = compose(
            &[5, 1, 2],
            &store,
            &schema,
            &VisibilityState::default(),
            &ResizeState::new(&schema),
            &SortState::default(),
        );
        assert_eq!(model.rows.len(), 1);
        assert_eq!(model.rows[0].handle, 1);
    }
}
