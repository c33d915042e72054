use super::Reducer;
use crate::state::{AgentState, StateUpdate};

/// Key-union merge for the tool-result map: new keys are added, existing
/// keys are overwritten by the incoming value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn apply(&self, state: &mut AgentState, update: &StateUpdate) {
        if let Some(incoming) = &update.tool_results
            && !incoming.is_empty()
        {
            for (k, v) in incoming.iter() {
                state.tool_results.insert(k.clone(), v.clone());
            }
        }
    }
}
