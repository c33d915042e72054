//! The graph executor.
//!
//! [`Engine`] owns the compiled node/edge tables and drives a run from the
//! entry node to the `End` sentinel: invoke node → merge update → resolve
//! successor. One node is active at a time; the engine alone mutates the
//! state record. Two guarantees hold for every run:
//!
//! - **Bounded**: a global iteration ceiling caps node transitions. Reaching
//!   it is not an error: the engine forces one transition to the configured
//!   fallback node (typically synthesis) so partial progress still yields an
//!   answer, then ends.
//! - **Non-aborting**: a node error is caught at the engine boundary,
//!   recorded into the state's `error` field plus the reasoning chain, and
//!   the run proceeds to the fallback node. The caller always receives a
//!   terminal `Final` or `Error` event; a run never hangs or exits silently.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, instrument};

use crate::config::RuntimeConfig;
use crate::event_bus::{EventBus, EventStream, OutputEvent};
use crate::graph::RouterEdge;
use crate::node::{Node, NodeContext};
use crate::reducers::ReducerRegistry;
use crate::state::{AgentState, StateUpdate};
use crate::types::NodeKind;
use crate::utils::ids::IdGenerator;

/// Executable workflow graph produced by
/// [`GraphBuilder::compile`](crate::graph::GraphBuilder::compile).
///
/// Cheap to clone; all tables live behind one `Arc`. Concurrent runs are
/// fully independent; each owns its state record and event bus.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, NodeKind>,
    routers: FxHashMap<NodeKind, RouterEdge>,
    fallback: Option<NodeKind>,
    config: RuntimeConfig,
    reducers: ReducerRegistry,
    ids: IdGenerator,
}

/// Errors surfaced by the engine itself (node failures are captured into
/// state instead).
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// The graph has no edge out of `Start`. Compile validation prevents
    /// this for builder-produced engines.
    #[error("no entry edge out of Start")]
    #[diagnostic(code(dialogos::engine::missing_entry))]
    MissingEntry,

    /// Execution reached a node with no registered implementation.
    #[error("node {kind} is not registered")]
    #[diagnostic(code(dialogos::engine::unknown_node))]
    UnknownNode { kind: String },

    /// The spawned run task failed to join (cancelled or panicked).
    #[error("run task join error: {0}")]
    #[diagnostic(code(dialogos::engine::join))]
    Join(#[from] JoinError),
}

/// Handle for a streaming invocation.
///
/// Dropping the handle aborts the run, the cancellation path for callers
/// that disappear (closed connections). In-flight tool calls are not
/// force-killed; their results die with the task.
pub struct RunHandle {
    join_handle: Option<JoinHandle<Result<AgentState, EngineError>>>,
    run_id: String,
}

impl RunHandle {
    /// Identifier of this run, for log correlation.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Abort the underlying run task.
    pub fn abort(&self) {
        if let Some(handle) = &self.join_handle {
            handle.abort();
        }
    }

    /// True once the run task has completed or aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Await the final state.
    pub async fn join(mut self) -> Result<AgentState, EngineError> {
        match self.join_handle.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => Err(EngineError::Join(err)),
            },
            None => Err(EngineError::MissingEntry),
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if let Some(handle) = &self.join_handle {
            handle.abort();
        }
    }
}

impl Engine {
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, NodeKind>,
        routers: FxHashMap<NodeKind, RouterEdge>,
        fallback: Option<NodeKind>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                nodes,
                edges,
                routers,
                fallback,
                config,
                reducers: ReducerRegistry::default(),
                ids: IdGenerator::new(),
            }),
        }
    }

    /// The runtime configuration this engine was compiled with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Run the graph to completion using the configured sinks.
    #[instrument(skip(self, initial), err)]
    pub async fn run(&self, initial: AgentState) -> Result<AgentState, EngineError> {
        let bus = self.inner.config.event_bus.build_event_bus();
        bus.listen_for_events();
        let result = self.run_with_bus(initial, &bus).await;
        bus.finish().await;
        result
    }

    /// Run the graph in a spawned task, returning a cancellation handle and
    /// the ordered event stream. The stream closes after the terminal
    /// `Final`/`Error` event.
    pub fn run_streaming(&self, initial: AgentState) -> (RunHandle, EventStream) {
        let bus = self.inner.config.event_bus.build_event_bus();
        let events = bus.subscribe();
        bus.listen_for_events();

        let engine = self.clone();
        let run_id = self.inner.ids.generate_run_id();
        let task_run_id = run_id.clone();
        let join = tokio::spawn(async move {
            let result = engine
                .run_with_bus(initial, &bus)
                .instrument(tracing::info_span!("run", id = %task_run_id))
                .await;
            bus.finish().await;
            result
        });

        (
            RunHandle {
                join_handle: Some(join),
                run_id,
            },
            events,
        )
    }

    /// Run the graph with event delivery to an existing bus (which must
    /// already be listening). Used by both public entry points and by the
    /// streaming adapter.
    pub async fn run_with_bus(
        &self,
        initial: AgentState,
        bus: &EventBus,
    ) -> Result<AgentState, EngineError> {
        let inner = &self.inner;
        let sender = bus.sender();

        let mut state = initial;
        let mut current = inner
            .edges
            .get(&NodeKind::Start)
            .cloned()
            .ok_or(EngineError::MissingEntry)?;
        let mut step: u64 = 0;
        let mut forced_terminal = false;
        let ceiling = inner.config.max_iterations as u64;

        while current.is_custom() {
            step += 1;
            let Some(node) = inner.nodes.get(&current) else {
                return Err(EngineError::UnknownNode {
                    kind: current.to_string(),
                });
            };

            let ctx = NodeContext {
                node_id: current.to_string(),
                step,
                event_sender: sender.clone(),
            };
            let _ = sender.send(OutputEvent::progress(current.to_string(), "started"));

            let span = tracing::info_span!("node", id = %current, step);
            match node.run(state.snapshot(), ctx).instrument(span).await {
                Ok(update) => {
                    if let Err(err) = inner.reducers.apply_all(&mut state, &update) {
                        tracing::error!(node = %current, error = %err, "reducer dispatch failed");
                    }
                    let _ = sender.send(OutputEvent::progress(current.to_string(), "completed"));
                }
                Err(err) => {
                    tracing::warn!(
                        node = %current,
                        step,
                        error = %err,
                        "node failed; routing to terminal node"
                    );
                    let update = StateUpdate::new()
                        .with_error(err.to_string())
                        .with_reasoning(format!("{current} failed: {err}"));
                    let _ = inner.reducers.apply_all(&mut state, &update);
                    let _ = sender.send(OutputEvent::progress(current.to_string(), "failed"));
                    current = self.terminal_hop(&current, &mut forced_terminal);
                    continue;
                }
            }

            let mut next = match self.resolve_next(&current, &state) {
                Some(next) => next,
                None => self.terminal_hop(&current, &mut forced_terminal),
            };

            if step >= ceiling && next.is_custom() {
                if !forced_terminal
                    && let Some(fallback) = &inner.fallback
                    && fallback != &current
                {
                    tracing::warn!(
                        step,
                        ceiling,
                        target = %fallback,
                        "iteration ceiling reached; forcing terminal transition"
                    );
                    forced_terminal = true;
                    next = fallback.clone();
                } else {
                    next = NodeKind::End;
                }
            }

            tracing::debug!(from = %current, to = %next, step, "transition");
            current = next;
        }

        let terminal = match (&state.final_response, &state.error) {
            (Some(text), _) => OutputEvent::Final { text: text.clone() },
            (None, Some(message)) => OutputEvent::Error {
                message: message.clone(),
            },
            (None, None) => OutputEvent::Final {
                text: String::new(),
            },
        };
        let _ = sender.send(terminal);

        tracing::info!(steps = step, "run completed");
        Ok(state)
    }

    /// Resolve the successor of `current`: router label lookup when a router
    /// is configured, else the static edge. `None` means no route resolved.
    fn resolve_next(&self, current: &NodeKind, state: &AgentState) -> Option<NodeKind> {
        if let Some(edge) = self.inner.routers.get(current) {
            let (label, target) = edge.resolve(state);
            match target {
                Some(next) => {
                    tracing::debug!(from = %current, %label, to = %next, "router decision");
                    Some(next)
                }
                None => {
                    tracing::warn!(from = %current, %label, "router label has no target");
                    None
                }
            }
        } else if let Some(next) = self.inner.edges.get(current) {
            Some(next.clone())
        } else {
            tracing::debug!(node = %current, "no outgoing edge; terminating");
            None
        }
    }

    /// Where to go when a node fails or no route resolves: the fallback
    /// node, exactly once per run, otherwise `End`.
    fn terminal_hop(&self, current: &NodeKind, forced_terminal: &mut bool) -> NodeKind {
        if !*forced_terminal
            && let Some(fallback) = &self.inner.fallback
            && fallback != current
        {
            *forced_terminal = true;
            fallback.clone()
        } else {
            NodeKind::End
        }
    }
}
