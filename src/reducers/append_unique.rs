use super::Reducer;
use crate::state::{AgentState, StateUpdate};
use crate::types::StateField;

/// Appends string entries to one of the value-deduplicated sequence fields
/// (citations, reasoning chain, learned facts).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppendUnique(pub StateField);

fn extend_unique(target: &mut Vec<String>, incoming: &[String]) {
    for entry in incoming {
        if !target.iter().any(|existing| existing == entry) {
            target.push(entry.clone());
        }
    }
}

impl Reducer for AppendUnique {
    fn apply(&self, state: &mut AgentState, update: &StateUpdate) {
        match self.0 {
            StateField::Citations => {
                if let Some(incoming) = &update.citations {
                    extend_unique(&mut state.citations, incoming);
                }
            }
            StateField::Reasoning => {
                if let Some(incoming) = &update.reasoning_chain {
                    extend_unique(&mut state.reasoning_chain, incoming);
                }
            }
            StateField::Facts => {
                if let Some(incoming) = &update.learned_facts {
                    extend_unique(&mut state.learned_facts, incoming);
                }
            }
            // Other fields have dedicated reducers.
            _ => {}
        }
    }
}
