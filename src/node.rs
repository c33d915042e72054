//! The node contract: a named async unit of work over the state record.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::event_bus::OutputEvent;
use crate::state::{StateSnapshot, StateUpdate};

/// A single processing stage in the graph.
///
/// Nodes receive an immutable snapshot and return a partial update; the
/// engine owns the mutable record and merges updates through the reducer
/// registry. A node must be individually retryable: failing never corrupts
/// state for the rest of the run.
///
/// Two behavioral classes exist by convention:
/// - **Transform nodes** call the language-model backend with a prompt built
///   from snapshot fields and parse the reply defensively.
/// - **Effect nodes** call into the tool registry and fold outcomes into the
///   tool-result map plus derived citations.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use dialogos::message::Message;
/// use dialogos::node::{Node, NodeContext, NodeError};
/// use dialogos::state::{StateSnapshot, StateUpdate};
///
/// struct GreetingNode;
///
/// #[async_trait]
/// impl Node for GreetingNode {
///     async fn run(
///         &self,
///         _snapshot: StateSnapshot,
///         _ctx: NodeContext,
///     ) -> Result<StateUpdate, NodeError> {
///         Ok(StateUpdate::new().with_messages(vec![Message::assistant("Hello!")]))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node with the given state snapshot and context.
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext)
    -> Result<StateUpdate, NodeError>;
}

/// Execution context passed to nodes.
///
/// Carries the node's identity, the step number within the run, and the
/// sender half of the run's event bus so nodes can surface progress, tool
/// boundaries, and token deltas while they execute.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Name of this node in the graph.
    pub node_id: String,
    /// 1-based step number within the run.
    pub step: u64,
    /// Ingress to the run's event bus.
    pub event_sender: flume::Sender<OutputEvent>,
}

impl NodeContext {
    /// Emit an event into the run's output sequence.
    pub fn emit(&self, event: OutputEvent) -> Result<(), NodeContextError> {
        self.event_sender
            .send(event)
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }

    /// Emit a progress event tagged with this node's identity.
    pub fn emit_progress(&self, status: impl Into<String>) -> Result<(), NodeContextError> {
        self.emit(OutputEvent::progress(self.node_id.clone(), status))
    }
}

/// Errors that can occur when using NodeContext methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    /// Event could not be sent because the bus is gone.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(dialogos::node::event_bus_unavailable),
        help("The run may have been cancelled; the bus closes with it.")
    )]
    EventBusUnavailable,
}

/// Errors that can occur during node execution.
///
/// These are caught at the engine boundary: the message is recorded into the
/// state's `error` field and the run proceeds to the terminal node rather
/// than aborting.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(dialogos::node::missing_input),
        help("Check that the upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// Language-model backend failure.
    #[error(transparent)]
    #[diagnostic(code(dialogos::node::provider))]
    Provider(#[from] crate::provider::ProviderError),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(dialogos::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(code(dialogos::node::validation))]
    ValidationFailed(String),

    /// Event bus communication error.
    #[error(transparent)]
    #[diagnostic(code(dialogos::node::event_bus))]
    EventBus(#[from] NodeContextError),
}
