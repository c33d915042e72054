use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in the caller-facing output sequence of a run.
///
/// Events are emitted by nodes (progress, tool boundaries, token deltas) and
/// by the engine itself (`Final` / `Error` terminate every run). The
/// streaming adapter may add `SideChannel` events extracted from tool
/// results; consumers must treat those as optional enrichment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputEvent {
    /// A node started, completed, or failed.
    Progress { node: String, status: String },
    /// An incremental piece of the reply text.
    TokenDelta { text: String },
    /// A tool invocation is about to run.
    ToolStart { tool: String, args: Value },
    /// A tool invocation finished; `result` is the raw outcome text.
    ToolEnd { tool: String, result: String },
    /// Structured payload extracted from a tool result for UI enrichment.
    SideChannel { payload: Value },
    /// The complete reply; always the last event of a successful run.
    Final { text: String },
    /// Terminal failure; always the last event of a failed run.
    Error { message: String },
}

impl OutputEvent {
    pub fn progress(node: impl Into<String>, status: impl Into<String>) -> Self {
        OutputEvent::Progress {
            node: node.into(),
            status: status.into(),
        }
    }

    pub fn token_delta(text: impl Into<String>) -> Self {
        OutputEvent::TokenDelta { text: text.into() }
    }

    pub fn tool_start(tool: impl Into<String>, args: Value) -> Self {
        OutputEvent::ToolStart {
            tool: tool.into(),
            args,
        }
    }

    pub fn tool_end(tool: impl Into<String>, result: impl Into<String>) -> Self {
        OutputEvent::ToolEnd {
            tool: tool.into(),
            result: result.into(),
        }
    }

    /// The serialized tag of this event's variant.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            OutputEvent::Progress { .. } => "progress",
            OutputEvent::TokenDelta { .. } => "token_delta",
            OutputEvent::ToolStart { .. } => "tool_start",
            OutputEvent::ToolEnd { .. } => "tool_end",
            OutputEvent::SideChannel { .. } => "side_channel",
            OutputEvent::Final { .. } => "final",
            OutputEvent::Error { .. } => "error",
        }
    }

    /// True for the two variants that terminate a run's event sequence.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputEvent::Final { .. } | OutputEvent::Error { .. })
    }

    /// Structured JSON form with a render timestamp, for sinks that ship
    /// events to log pipelines or web clients.
    pub fn to_json_value(&self) -> Value {
        use serde_json::json;

        let payload = serde_json::to_value(self).unwrap_or(Value::Null);
        json!({
            "event": payload,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }
}

impl fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputEvent::Progress { node, status } => write!(f, "[{node}] {status}"),
            OutputEvent::TokenDelta { text } => write!(f, "{text}"),
            OutputEvent::ToolStart { tool, args } => write!(f, "[tool {tool}] start {args}"),
            OutputEvent::ToolEnd { tool, result } => write!(f, "[tool {tool}] end {result}"),
            OutputEvent::SideChannel { payload } => write!(f, "[side-channel] {payload}"),
            OutputEvent::Final { text } => write!(f, "{text}"),
            OutputEvent::Error { message } => write!(f, "error: {message}"),
        }
    }
}
