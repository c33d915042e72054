use std::io::{self, Result as IoResult, Stdout, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::event::OutputEvent;
use crate::telemetry::{PlainFormatter, TelemetryFormatter};

/// Abstraction over an output target that consumes full events.
pub trait EventSink: Sync + Send {
    /// Handle a structured event. The sink decides how to serialize it.
    fn handle(&mut self, event: &OutputEvent) -> IoResult<()>;
}

/// Stdout sink with optional formatting.
pub struct StdOutSink<F: TelemetryFormatter = PlainFormatter> {
    handle: Stdout,
    formatter: F,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self {
            handle: io::stdout(),
            formatter: PlainFormatter::default(),
        }
    }
}

impl<F: TelemetryFormatter> StdOutSink<F> {
    pub fn with_formatter(formatter: F) -> Self {
        Self {
            handle: io::stdout(),
            formatter,
        }
    }
}

impl<F: TelemetryFormatter> EventSink for StdOutSink<F> {
    fn handle(&mut self, event: &OutputEvent) -> IoResult<()> {
        let rendered = self.formatter.render_event(event).join_lines();
        self.handle.write_all(rendered.as_bytes())?;
        self.handle.flush()
    }
}

/// In-memory sink for testing and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<OutputEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all captured events.
    pub fn snapshot(&self) -> Vec<OutputEvent> {
        self.entries.lock().clone()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &OutputEvent) -> IoResult<()> {
        self.entries.lock().push(event.clone());
        Ok(())
    }
}

/// Channel-based sink forwarding events to an async consumer without
/// blocking. Backs [`super::EventStream`] subscriptions.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OutputEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &OutputEvent) -> IoResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
