//! Output-event plumbing: event types, the fan-out bus, and sinks.
//!
//! Nodes and the engine publish [`OutputEvent`]s through a bus; sinks
//! (stdout, memory, per-request channels) consume them, and subscribers get
//! an ordered [`EventStream`] that closes when the run finishes.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::{EventBus, EventStream};
pub use event::OutputEvent;
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
