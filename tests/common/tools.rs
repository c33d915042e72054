use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use dialogos::tools::{Tool, ToolError};

/// Returns its `query` argument verbatim.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the query back"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        Ok(args
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

/// Fixed weather report with a citation URL and an embedded side-channel
/// block carrying coordinates.
pub struct WeatherTool;

pub const WEATHER_REPORT: &str = "Sunny in Paris, 22°C. Source: https://weather.example/paris \
[[side-channel]]{\"city\": \"Paris\", \"lat\": 48.85, \"lon\": 2.35}[[/side-channel]]";

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Current weather for a city"
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        Ok(WEATHER_REPORT.to_string())
    }
}

/// Fails with a transient error a fixed number of times, then succeeds.
pub struct FlakyTool {
    pub failures_before_success: u32,
    attempts: AtomicU32,
}

impl FlakyTool {
    pub fn new(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Tool for FlakyTool {
    fn name(&self) -> &str {
        "flaky"
    }

    fn description(&self) -> &str {
        "Fails transiently before succeeding"
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures_before_success {
            Err(ToolError::Network("connection reset".to_string()))
        } else {
            Ok("recovered".to_string())
        }
    }
}

/// Always fails with a terminal (non-retryable) error.
pub struct BadArgsTool;

#[async_trait]
impl Tool for BadArgsTool {
    fn name(&self) -> &str {
        "bad_args"
    }

    fn description(&self) -> &str {
        "Rejects every call"
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        Err(ToolError::InvalidArgs("city is required".to_string()))
    }
}

/// Sleeps past its own timeout budget.
pub struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Never finishes in time"
    }

    fn timeout_secs(&self) -> u64 {
        1
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok("too late".to_string())
    }
}

/// Retrieval double: each call pops the next scripted document set.
pub struct ScriptedSearchTool {
    results: Mutex<VecDeque<String>>,
}

impl ScriptedSearchTool {
    pub fn new(results: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().map(str::to_string).collect()),
        }
    }
}

#[async_trait]
impl Tool for ScriptedSearchTool {
    fn name(&self) -> &str {
        "search_documents"
    }

    fn description(&self) -> &str {
        "Searches the document store"
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        self.results
            .lock()
            .pop_front()
            .ok_or_else(|| ToolError::Failed("no more scripted results".to_string()))
    }
}
