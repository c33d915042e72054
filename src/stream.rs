//! The streaming adapter: linearizes a run into a caller-facing event
//! sequence with incremental delivery.
//!
//! Two delivery modes exist, chosen by an explicit capability flag rather
//! than inferred at runtime:
//!
//! - [`DeliveryMode::Native`]: the provider streams tokens; deltas are
//!   forwarded in arrival order with no buffering beyond event boundaries.
//! - [`DeliveryMode::Chunked`]: the graph runs to completion and the final
//!   text is re-emitted as ≈256-character `TokenDelta`s before `Final`.
//!   This preserves the incremental-delivery contract for callers even
//!   though generation was not incremental; a best-effort illusion, not a
//!   correctness guarantee. In both modes the concatenation of all deltas
//!   equals the final text.
//!
//! The adapter also performs side-channel extraction: tool results may embed
//! a delimited JSON block meant for a UI side panel. On every `ToolEnd` the
//! result text is scanned; a well-formed block yields exactly one
//! `SideChannel` event after the `ToolEnd`. Malformed blocks are logged and
//! skipped, never aborting the stream.

use futures_util::stream::{self, Stream};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::{Engine, EngineError, RunHandle};
use crate::event_bus::OutputEvent;
use crate::provider::ChatProvider;
use crate::state::AgentState;
use crate::utils::text::chunk_text;

/// Opening delimiter of an embedded side-channel block.
pub const SIDE_CHANNEL_OPEN: &str = "[[side-channel]]";
/// Closing delimiter of an embedded side-channel block.
pub const SIDE_CHANNEL_CLOSE: &str = "[[/side-channel]]";

/// How reply text reaches the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Forward provider token deltas as they arrive.
    Native,
    /// Run to completion, then chunk the final text.
    Chunked,
}

/// Wraps an [`Engine`] invocation into an ordered output-event sequence.
pub struct StreamingAdapter {
    engine: Engine,
    mode: DeliveryMode,
}

impl StreamingAdapter {
    #[must_use]
    pub fn new(engine: Engine, mode: DeliveryMode) -> Self {
        Self { engine, mode }
    }

    /// Picks the delivery mode from the provider's capability flag.
    #[must_use]
    pub fn for_provider(engine: Engine, provider: &dyn ChatProvider) -> Self {
        let mode = if provider.supports_streaming() {
            DeliveryMode::Native
        } else {
            DeliveryMode::Chunked
        };
        Self::new(engine, mode)
    }

    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Start a run and return its caller-facing event stream.
    ///
    /// Dropping the returned [`ReplyStream`] cancels the run (the caller
    /// disconnected); in-flight tool calls are not force-killed, their
    /// results are discarded with the task.
    pub fn run(&self, initial: AgentState) -> ReplyStream {
        let chunk_size = self.engine.config().chunk_size;
        let mode = self.mode;
        let (handle, mut raw) = self.engine.run_streaming(initial);
        let (tx, rx) = mpsc::unbounded_channel();

        let forward = tokio::spawn(async move {
            while let Some(event) = raw.recv().await {
                match event {
                    OutputEvent::ToolEnd { tool, result } => {
                        let payload = extract_side_channel(&result);
                        let _ = tx.send(OutputEvent::ToolEnd { tool, result });
                        if let Some(payload) = payload {
                            let _ = tx.send(OutputEvent::SideChannel { payload });
                        }
                    }
                    OutputEvent::TokenDelta { text } => {
                        // In chunked mode deltas are synthesized from the
                        // final text; stray native ones would break the
                        // round-trip law.
                        if mode == DeliveryMode::Native {
                            let _ = tx.send(OutputEvent::TokenDelta { text });
                        }
                    }
                    OutputEvent::Final { text } => {
                        if mode == DeliveryMode::Chunked {
                            for chunk in chunk_text(&text, chunk_size) {
                                let _ = tx.send(OutputEvent::token_delta(chunk));
                            }
                        }
                        let _ = tx.send(OutputEvent::Final { text });
                    }
                    other => {
                        let _ = tx.send(other);
                    }
                }
            }
        });

        ReplyStream {
            rx,
            handle,
            forward,
        }
    }
}

/// The caller-facing event sequence of one streamed run.
///
/// Ends after the terminal `Final`/`Error` event. Dropping it aborts the
/// underlying run.
pub struct ReplyStream {
    rx: mpsc::UnboundedReceiver<OutputEvent>,
    handle: RunHandle,
    forward: JoinHandle<()>,
}

impl ReplyStream {
    /// Await the next event; `None` once the run has finished.
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.rx.recv().await
    }

    /// Identifier of the underlying run.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.handle.run_id()
    }

    /// Cancel the run.
    pub fn abort(&self) {
        self.handle.abort();
        self.forward.abort();
    }

    /// Collect every remaining event until the stream closes.
    pub async fn collect_all(mut self) -> Vec<OutputEvent> {
        let mut collected = Vec::new();
        while let Some(event) = self.recv().await {
            collected.push(event);
        }
        collected
    }

    /// Convert into a `futures` Stream; the run stays alive for as long as
    /// the stream does.
    pub fn into_async_stream(self) -> impl Stream<Item = OutputEvent> {
        stream::unfold(self, |mut reply| async move {
            reply.recv().await.map(|event| (event, reply))
        })
    }

    /// Collect every remaining event, then return them together with the
    /// final state.
    pub async fn finish(mut self) -> (Vec<OutputEvent>, Result<AgentState, EngineError>) {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            events.push(event);
        }
        let ReplyStream {
            handle, forward, ..
        } = self;
        let result = handle.join().await;
        let _ = forward.await;
        (events, result)
    }

    /// Drain the stream and return the final state.
    pub async fn join(self) -> Result<AgentState, EngineError> {
        let ReplyStream {
            mut rx,
            handle,
            forward,
        } = self;
        let result = handle.join().await;
        let _ = forward.await;
        rx.close();
        result
    }
}

/// Scans a tool result for an embedded side-channel block.
///
/// Returns the parsed payload of the first well-formed block, or `None`
/// when no marker is present or its contents fail to parse (logged, never
/// fatal).
#[must_use]
pub fn extract_side_channel(result: &str) -> Option<Value> {
    let open = result.find(SIDE_CHANNEL_OPEN)?;
    let after_open = open + SIDE_CHANNEL_OPEN.len();
    let close = result[after_open..].find(SIDE_CHANNEL_CLOSE)?;
    let inner = &result[after_open..after_open + close];

    match serde_json::from_str::<Value>(inner.trim()) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::warn!(
                error = %err,
                block = %crate::utils::text::truncate_preview(inner, 80),
                "malformed side-channel payload; skipping"
            );
            None
        }
    }
}
