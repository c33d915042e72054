use super::Reducer;
use crate::state::{AgentState, StateUpdate};
use rustc_hash::FxHashSet;

/// Appends messages, skipping ids already present.
///
/// Dedup by id (never by content) keeps the merge idempotent when the same
/// partial update is applied twice, while still allowing two turns with
/// identical text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddMessages;

impl Reducer for AddMessages {
    fn apply(&self, state: &mut AgentState, update: &StateUpdate) {
        if let Some(incoming) = &update.messages
            && !incoming.is_empty()
        {
            let mut seen: FxHashSet<String> =
                state.messages.iter().map(|m| m.id.clone()).collect();
            for message in incoming {
                if seen.insert(message.id.clone()) {
                    state.messages.push(message.clone());
                }
            }
        }
    }
}
