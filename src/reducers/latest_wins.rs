use super::Reducer;
use crate::state::{AgentState, StateUpdate};

/// Overwrites every scalar field the update names: inputs, counters,
/// routing hints, final response, and the node-local error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LatestWins;

impl Reducer for LatestWins {
    fn apply(&self, state: &mut AgentState, update: &StateUpdate) {
        if let Some(input) = &update.input {
            state.input = input.clone();
        }
        if let Some(clean_input) = &update.clean_input {
            state.clean_input = clean_input.clone();
        }
        if let Some(depth) = update.research_depth {
            state.research_depth = depth;
        }
        if let Some(count) = update.iteration_count {
            state.iteration_count = count;
        }
        if let Some(sender) = &update.sender {
            state.sender = Some(sender.clone());
        }
        if let Some(decision) = &update.current_decision {
            state.current_decision = Some(decision.clone());
        }
        if let Some(text) = &update.final_response {
            state.final_response = Some(text.clone());
        }
        if let Some(message) = &update.error {
            state.error = Some(message.clone());
        }
    }
}

/// Latest-wins replacement of the structured plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetPlan;

impl Reducer for SetPlan {
    fn apply(&self, state: &mut AgentState, update: &StateUpdate) {
        if let Some(plan) = &update.plan {
            state.plan = Some(plan.clone());
        }
    }
}
