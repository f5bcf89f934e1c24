use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::schema::ColumnSchema;

/// Which way a drag grows a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// An in-progress width drag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub column_id: String,
    pub start_pointer_x: f64,
    pub start_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnWidth {
    current: f64,
    min: f64,
    max: f64,
}

impl ColumnWidth {
    fn clamp(&self, width: f64) -> f64 {
        width.max(self.min).min(self.max)
    }
}

/// Current width of every column plus the optional active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    columns: BTreeMap<String, ColumnWidth>,
    session: Option<ResizeSession>,
    direction: ResizeDirection,
}

impl ResizeState {
    /// Every column starts at its initial width, clamped to its bounds.
    pub fn new(schema: &ColumnSchema) -> Self {
        let columns = schema
            .columns()
            .iter()
            .map(|c| {
                let width = ColumnWidth {
                    current: c.clamp_width(c.initial_width),
                    min: c.min_width,
                    max: c.max_width,
                };
                (c.id.clone(), width)
            })
            .collect();
        Self {
            columns,
            session: None,
            direction: ResizeDirection::default(),
        }
    }

    pub fn with_direction(mut self, direction: ResizeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn width(&self, column_id: &str) -> Option<f64> {
        self.columns.get(column_id).map(|c| c.current)
    }

    pub fn session(&self) -> Option<&ResizeSession> {
        self.session.as_ref()
    }

    pub fn is_resizing(&self, column_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.column_id == column_id)
    }
}

/// Opens a drag session on `column_id`.
///
/// Ignored while another column is being resized, for unknown columns and for
/// fixed-width columns. Pressing again on the column already being resized
/// restarts its session from the new pointer position.
pub fn begin_resize(state: &ResizeState, column_id: &str, pointer_x: f64) -> ResizeState {
    if let Some(session) = &state.session
        && session.column_id != column_id
    {
        trace!(
            "Resize of \"{}\" already in progress, ignoring \"{}\"",
            session.column_id, column_id
        );
        return state.clone();
    }
    let Some(column) = state.columns.get(column_id) else {
        return state.clone();
    };
    if column.min >= column.max {
        trace!("Column \"{column_id}\" has a fixed width");
        return state.clone();
    }

    debug!("Begin resize of \"{column_id}\" at x={pointer_x}");
    let mut next = state.clone();
    next.session = Some(ResizeSession {
        column_id: column_id.to_string(),
        start_pointer_x: pointer_x,
        start_width: column.current,
    });
    next
}

/// Applies the pointer movement of the open session to its column width.
/// Without a session the move is dropped.
pub fn update_resize(state: &ResizeState, pointer_x: f64) -> ResizeState {
    let Some(session) = &state.session else {
        return state.clone();
    };
    if !pointer_x.is_finite() {
        return state.clone();
    }

    let mut delta = pointer_x - session.start_pointer_x;
    if state.direction == ResizeDirection::RightToLeft {
        delta = -delta;
    }

    let mut next = state.clone();
    if let Some(column) = next.columns.get_mut(&session.column_id) {
        column.current = column.clamp(session.start_width + delta);
        trace!(
            "Resizing \"{}\" to {} (delta {})",
            session.column_id, column.current, delta
        );
    }
    next
}

/// Closes the open session. Widths set while dragging are kept.
pub fn end_resize(state: &ResizeState) -> ResizeState {
    if let Some(session) = &state.session {
        debug!(
            "End resize of \"{}\" at width {:?}",
            session.column_id,
            state.width(&session.column_id)
        );
    }
    let mut next = state.clone();
    next.session = None;
    next
}

/// Puts `column_id` back to its initial width, whether or not a drag is open.
pub fn reset_width(state: &ResizeState, column_id: &str, schema: &ColumnSchema) -> ResizeState {
    let mut next = state.clone();
    if let (Some(spec), Some(column)) = (schema.get(column_id), next.columns.get_mut(column_id)) {
        column.current = spec.clamp_width(spec.initial_width);
        debug!("Reset width of \"{}\" to {}", column_id, column.current);
    }
    next
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::schema::ColumnSpec;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            ColumnSpec::new("name")
                .min_width(50.0)
                .max_width(300.0)
                .initial_width(100.0),
            ColumnSpec::new("price").initial_width(80.0),
            ColumnSpec::new("id")
                .min_width(40.0)
                .max_width(40.0)
                .initial_width(40.0),
        ])
        .unwrap()
    }

    #[test]
    fn starts_at_initial_width() {
        let state = ResizeState::new(&schema());
        assert_eq!(state.width("name"), Some(100.0));
        assert_eq!(state.width("price"), Some(80.0));
        assert!(state.session().is_none());
    }

    #[test]
    fn initial_width_is_clamped() {
        let schema = ColumnSchema::new(vec![ColumnSpec::new("a").min_width(30.0).initial_width(5.0)])
            .unwrap();
        assert_eq!(ResizeState::new(&schema).width("a"), Some(30.0));
    }

    #[test]
    fn drag_updates_width_live() {
        let state = begin_resize(&ResizeState::new(&schema()), "name", 200.0);
        assert!(state.is_resizing("name"));
        let state = update_resize(&state, 230.0);
        assert_eq!(state.width("name"), Some(130.0));
        let state = update_resize(&state, 190.0);
        assert_eq!(state.width("name"), Some(90.0));
        let state = end_resize(&state);
        assert!(!state.is_resizing("name"));
        assert_eq!(state.width("name"), Some(90.0));
    }

    #[test]
    fn width_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1234);
        let base = ResizeState::new(&schema());
        for _ in 0..500 {
            let start = rng.random_range(-1e6..1e6);
            let end = rng.random_range(-1e9..1e9);
            let state = update_resize(&begin_resize(&base, "name", start), end);
            let width = state.width("name").unwrap();
            assert!((50.0..=300.0).contains(&width), "width {width} out of bounds");
        }
        let state = update_resize(&begin_resize(&base, "name", 0.0), f64::MAX);
        assert_eq!(state.width("name"), Some(300.0));
        let state = update_resize(&begin_resize(&base, "name", 0.0), f64::MIN);
        assert_eq!(state.width("name"), Some(50.0));
    }

    #[test]
    fn only_one_session_at_a_time() {
        let state = begin_resize(&ResizeState::new(&schema()), "name", 10.0);
        let state = begin_resize(&state, "price", 500.0);
        assert!(state.is_resizing("name"));
        assert!(!state.is_resizing("price"));
    }

    #[test]
    fn moves_without_session_are_ignored() {
        let state = ResizeState::new(&schema());
        assert_eq!(update_resize(&state, 1000.0), state);
    }

    #[test]
    fn fixed_width_column_cannot_be_dragged() {
        let state = ResizeState::new(&schema());
        assert_eq!(begin_resize(&state, "id", 10.0), state);
    }

    #[test]
    fn right_to_left_inverts_delta() {
        let state = ResizeState::new(&schema()).with_direction(ResizeDirection::RightToLeft);
        let state = update_resize(&begin_resize(&state, "name", 100.0), 80.0);
        assert_eq!(state.width("name"), Some(120.0));
    }

    #[test]
    fn reset_restores_initial_width_during_drag() {
        let schema = schema();
        let state = update_resize(&begin_resize(&ResizeState::new(&schema), "name", 0.0), 150.0);
        assert_eq!(state.width("name"), Some(250.0));
        let state = reset_width(&state, "name", &schema);
        assert_eq!(state.width("name"), Some(100.0));
        assert!(state.is_resizing("name"));
    }
}
