use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::{
    reducers::{AddMessages, AppendUnique, LatestWins, MapMerge, Reducer, ReducerError, SetPlan},
    state::{AgentState, StateUpdate},
    types::StateField,
};
use tracing::instrument;

/// Dispatches a [`StateUpdate`] to the reducer registered per state field.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<StateField, Vec<Arc<dyn Reducer>>>,
}

/// Guard that checks whether an update actually carries data for a field,
/// so the registry can skip reducers with nothing to do.
fn field_guard(field: &StateField, update: &StateUpdate) -> bool {
    match field {
        StateField::Messages => update.messages.as_ref().is_some_and(|v| !v.is_empty()),
        StateField::Plan => update.plan.is_some(),
        StateField::ToolResults => update.tool_results.as_ref().is_some_and(|m| !m.is_empty()),
        StateField::Citations => update.citations.as_ref().is_some_and(|v| !v.is_empty()),
        StateField::Reasoning => update
            .reasoning_chain
            .as_ref()
            .is_some_and(|v| !v.is_empty()),
        StateField::Facts => update.learned_facts.as_ref().is_some_and(|v| !v.is_empty()),
        StateField::Scalars => {
            update.input.is_some()
                || update.clean_input.is_some()
                || update.research_depth.is_some()
                || update.iteration_count.is_some()
                || update.sender.is_some()
                || update.current_decision.is_some()
                || update.final_response.is_some()
                || update.error.is_some()
        }
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(StateField::Messages, Arc::new(AddMessages))
            .register(StateField::Plan, Arc::new(SetPlan))
            .register(StateField::ToolResults, Arc::new(MapMerge))
            .register(
                StateField::Citations,
                Arc::new(AppendUnique(StateField::Citations)),
            )
            .register(
                StateField::Reasoning,
                Arc::new(AppendUnique(StateField::Reasoning)),
            )
            .register(StateField::Facts, Arc::new(AppendUnique(StateField::Facts)))
            .register(StateField::Scalars, Arc::new(LatestWins));
        registry
    }
}

impl ReducerRegistry {
    /// Creates an empty registry; [`Default`] wires the standard rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Registers a reducer for a field. Multiple reducers on the same field
    /// apply in registration order.
    pub fn register(&mut self, field: StateField, reducer: Arc<dyn Reducer>) -> &mut Self {
        self.reducer_map.entry(field).or_default().push(reducer);
        self
    }

    /// Applies the reducers of a single field, skipping when the update has
    /// no data for it.
    pub fn try_update(
        &self,
        field: StateField,
        state: &mut AgentState,
        update: &StateUpdate,
    ) -> Result<(), ReducerError> {
        if !field_guard(&field, update) {
            return Ok(());
        }

        if let Some(reducers) = self.reducer_map.get(&field) {
            for reducer in reducers {
                reducer.apply(state, update);
            }
            Ok(())
        } else {
            Err(ReducerError::UnknownField(field))
        }
    }

    /// Applies a full update across every registered field.
    #[instrument(skip(self, state, update), err)]
    pub fn apply_all(
        &self,
        state: &mut AgentState,
        update: &StateUpdate,
    ) -> Result<(), ReducerError> {
        for field in self.reducer_map.keys() {
            self.try_update(field.clone(), state, update)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use serde_json::json;

    #[test]
    fn apply_all_merges_every_named_field() {
        let registry = ReducerRegistry::default();
        let mut state = AgentState::new_with_user_input("q");

        let mut results = FxHashMap::default();
        results.insert("weather".to_string(), json!({"ok": true}));
        let update = StateUpdate::new()
            .with_messages(vec![Message::assistant("working on it")])
            .with_tool_results(results)
            .with_citations(vec!["https://example.com".to_string()])
            .with_decision("tools");

        registry.apply_all(&mut state, &update).unwrap();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.tool_results.len(), 1);
        assert_eq!(state.citations.len(), 1);
        assert_eq!(state.current_decision.as_deref(), Some("tools"));
    }

    #[test]
    fn replaying_an_update_is_idempotent_for_append_fields() {
        let registry = ReducerRegistry::default();
        let mut state = AgentState::default();

        let update = StateUpdate::new()
            .with_messages(vec![Message::assistant("once")])
            .with_citations(vec!["https://example.com".to_string()])
            .with_reasoning("decided to retrieve");

        registry.apply_all(&mut state, &update).unwrap();
        registry.apply_all(&mut state, &update).unwrap();

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.citations.len(), 1);
        assert_eq!(state.reasoning_chain.len(), 1);
    }

    #[test]
    fn scalar_overwrite_prefers_latest_writer() {
        let registry = ReducerRegistry::default();
        let mut state = AgentState::default();

        registry
            .apply_all(&mut state, &StateUpdate::new().with_decision("plan"))
            .unwrap();
        registry
            .apply_all(&mut state, &StateUpdate::new().with_decision("respond"))
            .unwrap();
        assert_eq!(state.current_decision.as_deref(), Some("respond"));
    }

    #[test]
    fn empty_registry_rejects_populated_fields() {
        let registry = ReducerRegistry::new();
        let mut state = AgentState::default();
        let update = StateUpdate::new().with_decision("x");
        let err = registry.apply_all(&mut state, &update);
        // No reducers registered at all: nothing to iterate, so this passes.
        assert!(err.is_ok());
        let err = registry.try_update(StateField::Scalars, &mut state, &update);
        assert!(err.is_err());
    }
}
