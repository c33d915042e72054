//! Runtime configuration for graph execution and event delivery.

use crate::event_bus::{EventBus, MemorySink, StdOutSink};

/// Caller-tunable execution settings.
///
/// Values resolve from the environment (via `.env` when present) so
/// deployments can adjust behavior without code changes:
/// `DIALOGOS_MAX_ITERATIONS`, `DIALOGOS_MAX_RESEARCH_DEPTH`,
/// `DIALOGOS_CHUNK_SIZE`.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Global cap on node transitions per run; the sole infinite-loop guard.
    /// Reaching it forces a terminal transition, it is not an error.
    pub max_iterations: u32,
    /// Opt-in stricter bound on retrieval passes, consulted by the grade
    /// router. Defaults to `max_iterations`, which leaves the global ceiling
    /// as the only effective bound.
    pub max_research_depth: u32,
    /// Chunk size (in characters) for the streaming adapter's fallback mode.
    pub chunk_size: usize,
    /// Sink configuration for runs started without an explicit bus.
    pub event_bus: EventBusConfig,
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 8;
    pub const DEFAULT_CHUNK_SIZE: usize = 256;

    fn env_u32(key: &str, default: u32) -> u32 {
        std::env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    #[must_use]
    pub fn with_max_research_depth(mut self, depth: u32) -> Self {
        self.max_research_depth = depth;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        dotenvy::dotenv().ok();
        let max_iterations =
            Self::env_u32("DIALOGOS_MAX_ITERATIONS", Self::DEFAULT_MAX_ITERATIONS).max(1);
        Self {
            max_iterations,
            max_research_depth: Self::env_u32("DIALOGOS_MAX_RESEARCH_DEPTH", max_iterations),
            chunk_size: Self::env_u32(
                "DIALOGOS_CHUNK_SIZE",
                Self::DEFAULT_CHUNK_SIZE as u32,
            )
            .max(1) as usize,
            event_bus: EventBusConfig::default(),
        }
    }
}

/// Which sinks a run's event bus starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

/// Declarative event-bus setup, turned into a live bus per run.
#[derive(Clone, Debug, Default)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn with_stdout() -> Self {
        Self {
            sinks: vec![SinkConfig::StdOut],
        }
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
        self
    }

    /// Builds a live bus with the configured sinks.
    #[must_use]
    pub fn build_event_bus(&self) -> EventBus {
        let bus = EventBus::without_sinks();
        for sink in &self.sinks {
            match sink {
                SinkConfig::StdOut => bus.add_sink(StdOutSink::default()),
                SinkConfig::Memory => bus.add_sink(MemorySink::new()),
            }
        }
        bus
    }
}
