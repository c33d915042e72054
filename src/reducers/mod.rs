//! State merge strategies.
//!
//! Every reducer folds one channel of a [`StateUpdate`] into the owned
//! [`AgentState`]. The registry dispatches per [`StateField`], so the merge
//! rules live in one place and nodes stay declarative. Append-type reducers
//! are idempotent under replay (dedup by id or value); scalar reducers
//! overwrite with the most recent writer.

mod add_messages;
mod append_unique;
mod latest_wins;
mod map_merge;
mod reducer_registry;

pub use add_messages::AddMessages;
pub use append_unique::AppendUnique;
pub use latest_wins::{LatestWins, SetPlan};
pub use map_merge::MapMerge;
pub use reducer_registry::ReducerRegistry;

use crate::state::{AgentState, StateUpdate};
use crate::types::StateField;
use std::fmt;

/// Unified reducer trait: mutate `state` using the relevant slice of `update`.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut AgentState, update: &StateUpdate);
}

/// Errors surfaced by the reducer registry.
#[derive(Debug)]
pub enum ReducerError {
    /// No reducer registered for a field that carried data.
    UnknownField(StateField),
}

impl fmt::Display for ReducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducerError::UnknownField(field) => {
                write!(f, "no reducers registered for field: {field}")
            }
        }
    }
}

impl std::error::Error for ReducerError {}
