//! Core identifiers for the workflow graph and the state record.
//!
//! [`NodeKind`] names the vertices of the execution graph, with virtual
//! `Start`/`End` endpoints that are never executed. [`StateField`] names the
//! merge channels of the state record; each field has its own reducer and
//! update semantics (see [`crate::reducers`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within a workflow graph.
///
/// `Start` and `End` are virtual endpoints: they carry edges but no
/// executable node. All real processing stages are `Custom` names.
///
/// # Examples
///
/// ```
/// use dialogos::types::NodeKind;
///
/// let analyze = NodeKind::Custom("analyze".to_string());
/// assert!(analyze.is_custom());
/// assert_eq!(NodeKind::from("End"), NodeKind::End);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry point; the edge out of `Start` selects the first node.
    Start,
    /// Virtual terminal; routing to `End` completes the run.
    End,
    /// A named processing stage registered with the graph builder.
    Custom(String),
}

impl NodeKind {
    /// Returns `true` if this is the [`Start`](Self::Start) endpoint.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the [`End`](Self::End) endpoint.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is an executable node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

// Developer experience: allow string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

/// Identifies a merge channel of the state record.
///
/// Each variant maps to one reducer dispatch in the registry:
/// append-with-dedup for the sequence fields, key-union for tool results,
/// latest-wins for the plan and every scalar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateField {
    /// Conversation turns; append-only, deduplicated by message id.
    Messages,
    /// The structured execution plan; latest writer wins.
    Plan,
    /// Tool name → result map; merged by key union.
    ToolResults,
    /// Citation URLs; append-only, deduplicated by value.
    Citations,
    /// Reasoning-chain entries; append-only, deduplicated by value.
    Reasoning,
    /// Learned facts; append-only, deduplicated by value.
    Facts,
    /// All remaining scalar fields (inputs, counters, routing hints,
    /// final response, error); each overwritten by the most recent writer.
    Scalars,
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Messages => write!(f, "messages"),
            Self::Plan => write!(f, "plan"),
            Self::ToolResults => write!(f, "tool_results"),
            Self::Citations => write!(f, "citations"),
            Self::Reasoning => write!(f, "reasoning_chain"),
            Self::Facts => write!(f, "learned_facts"),
            Self::Scalars => write!(f, "scalars"),
        }
    }
}
