use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::schema::ColumnSchema;

/// Ids of the columns the user has hidden.
///
/// Ids of columns that cannot hide are never stored, so the set always
/// matches what is actually rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityState {
    hidden: BTreeSet<String>,
}

impl VisibilityState {
    pub fn is_visible(&self, column_id: &str) -> bool {
        !self.hidden.contains(column_id)
    }

    pub fn hidden(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    /// True when no hideable column is hidden. Non-hideable columns are
    /// always shown and do not take part in the check.
    pub fn all_visible(&self, schema: &ColumnSchema) -> bool {
        schema
            .hideable()
            .fold(true, |all, column| all && self.is_visible(&column.id))
    }
}

/// Flips a single column, unless it is unknown or cannot hide.
pub fn toggle_column(
    state: &VisibilityState,
    column_id: &str,
    schema: &ColumnSchema,
) -> VisibilityState {
    if !schema.get(column_id).is_some_and(|c| c.can_hide) {
        trace!("Ignoring visibility toggle on \"{column_id}\"");
        return state.clone();
    }

    let mut next = state.clone();
    if !next.hidden.remove(column_id) {
        next.hidden.insert(column_id.to_string());
    }
    debug!(
        "Column \"{}\" is now {}",
        column_id,
        if next.is_visible(column_id) { "visible" } else { "hidden" }
    );
    next
}

/// Hides every hideable column when all of them are visible, otherwise shows
/// all of them.
pub fn toggle_all(state: &VisibilityState, schema: &ColumnSchema) -> VisibilityState {
    let hidden = if state.all_visible(schema) {
        schema.hideable().map(|c| c.id.clone()).collect()
    } else {
        BTreeSet::new()
    };
    debug!("Toggle all columns, {} hidden", hidden.len());
    VisibilityState { hidden }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::schema::ColumnSpec;

    const IDS: [&str; 5] = ["name", "price", "quality", "description", "image"];

    fn schema() -> ColumnSchema {
        ColumnSchema::new(
            IDS.iter()
                .map(|&id| ColumnSpec::new(id).can_hide(id != "name"))
                .collect(),
        )
        .unwrap()
    }

    fn random_state(rng: &mut StdRng, schema: &ColumnSchema) -> VisibilityState {
        let mut state = VisibilityState::default();
        for id in IDS {
            if rng.random_bool(0.5) {
                state = toggle_column(&state, id, schema);
            }
        }
        state
    }

    #[test]
    fn toggles_hideable_column() {
        let schema = schema();
        let hidden = toggle_column(&VisibilityState::default(), "price", &schema);
        assert!(!hidden.is_visible("price"));
        let shown = toggle_column(&hidden, "price", &schema);
        assert_eq!(shown, VisibilityState::default());
    }

    #[test]
    fn lists_hidden_columns_in_id_order() {
        let schema = schema();
        let mut state = toggle_column(&VisibilityState::default(), "quality", &schema);
        state = toggle_column(&state, "image", &schema);
        state = toggle_column(&state, "description", &schema);
        assert_eq!(state.hidden().collect::<Vec<_>>(), ["description", "image", "quality"]);
        assert_eq!(toggle_all(&state, &schema).hidden().count(), 0);
    }

    #[test]
    fn non_hideable_column_is_a_no_op() {
        let schema = schema();
        let state = toggle_column(&VisibilityState::default(), "name", &schema);
        assert!(state.is_visible("name"));
        assert_eq!(state.hidden_count(), 0);
    }

    #[test]
    fn non_hideable_column_survives_random_toggles() {
        let schema = schema();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut state = random_state(&mut rng, &schema);
            for _ in 0..20 {
                let before = state.clone();
                let id = IDS[rng.random_range(0..IDS.len())];
                state = toggle_column(&state, id, &schema);
                if id == "name" {
                    assert_eq!(state, before);
                }
                assert!(state.is_visible("name"));
            }
        }
    }

    #[test]
    fn toggle_all_hides_only_hideable_columns() {
        let schema = schema();
        let state = toggle_all(&VisibilityState::default(), &schema);
        assert!(state.is_visible("name"));
        assert_eq!(state.hidden_count(), 4);
    }

    #[test]
    fn toggle_all_shows_everything_when_some_hidden() {
        let schema = schema();
        let partial = toggle_column(&VisibilityState::default(), "image", &schema);
        assert!(!partial.all_visible(&schema));
        let state = toggle_all(&partial, &schema);
        assert!(state.all_visible(&schema));
        assert_eq!(state.hidden_count(), 0);
    }

    #[test]
    fn fixed_column_does_not_affect_all_visible() {
        let schema = schema();
        assert!(VisibilityState::default().all_visible(&schema));
    }

    #[test]
    fn toggle_all_twice_restores_start() {
        let schema = schema();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let start = random_state(&mut rng, &schema);
            let round_trip = toggle_all(&toggle_all(&start, &schema), &schema);
            if start.all_visible(&schema) || start.hidden_count() == schema.hideable().count() {
                assert_eq!(round_trip, start);
            } else {
                // A partial selection collapses to "all shown" after one
                // toggle, which is the fixed point of the pair.
                let settled = toggle_all(&round_trip, &schema);
                assert_eq!(toggle_all(&settled, &schema), round_trip);
            }
        }
    }
}
