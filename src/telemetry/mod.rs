//! Event formatting for sinks and tracing subscriber setup.

use crate::event_bus::OutputEvent;
use std::io::IsTerminal;
use std::sync::Once;

pub const LINE_COLOR: &str = "\x1b[35m"; // magenta
pub const RESET_COLOR: &str = "\x1b[0m";

/// Formatter color mode for telemetry output.
///
/// - [`FormatterMode::Auto`]: detects TTY capability via `stderr.is_terminal()`
/// - [`FormatterMode::Colored`]: always include ANSI codes
/// - [`FormatterMode::Plain`]: never include ANSI codes (logs, files)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterMode {
    #[default]
    Auto,
    Colored,
    Plain,
}

impl FormatterMode {
    /// Returns true if this mode should use colored output.
    pub fn is_colored(&self) -> bool {
        match self {
            FormatterMode::Auto => std::io::stderr().is_terminal(),
            FormatterMode::Colored => true,
            FormatterMode::Plain => false,
        }
    }
}

/// Rendered output for one event, consumable by sinks.
#[derive(Clone, Debug, Default)]
pub struct EventRender {
    pub context: Option<String>,
    pub lines: Vec<String>,
}

impl EventRender {
    pub fn join_lines(&self) -> String {
        self.lines.join("")
    }
}

pub trait TelemetryFormatter: Send + Sync {
    fn render_event(&self, event: &OutputEvent) -> EventRender;
}

/// Plain text formatter with optional ANSI color codes.
pub struct PlainFormatter {
    mode: FormatterMode,
}

impl PlainFormatter {
    pub fn new() -> Self {
        Self {
            mode: FormatterMode::Auto,
        }
    }

    pub fn with_mode(mode: FormatterMode) -> Self {
        Self { mode }
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryFormatter for PlainFormatter {
    fn render_event(&self, event: &OutputEvent) -> EventRender {
        let line = if self.mode.is_colored() {
            format!("{LINE_COLOR}{event}{RESET_COLOR}\n")
        } else {
            format!("{event}\n")
        };
        EventRender {
            context: Some(event.kind_label().to_string()),
            lines: vec![line],
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global tracing subscriber once.
///
/// Filter level comes from `RUST_LOG` (default `info`). Safe to call from
/// multiple entry points; later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
