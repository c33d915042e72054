use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use super::error::ToolError;
use super::retry::RetryPolicy;
use crate::utils::text::truncate_preview;

/// An externally-provided callable capability.
///
/// Implementations live outside this crate (web search, file access,
/// retrieval backends); the engine only needs the name, a schema to hand to
/// the model, and an async execution entry point. Output is free text;
/// structure, if any, is embedded by convention and interpreted by callers.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name (used in plans and model tool calls).
    fn name(&self) -> &str;

    /// Human-readable description shown to the planner model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    /// Execute with the given arguments, returning raw result text.
    async fn execute(&self, args: Value) -> Result<String, ToolError>;

    /// Local timeout budget for a single invocation.
    fn timeout_secs(&self) -> u64 {
        30
    }
}

/// Descriptor advertised to the planner model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// Structured result of one tool execution, retries included.
///
/// Either `result` (success) or `error` (failure) is set, never both. The
/// attempt count makes retry behavior observable to tests and logs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub tool: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
}

impl ToolOutcome {
    #[must_use]
    pub fn ok(tool: &str, result: String, attempts: u32) -> Self {
        Self {
            tool: tool.to_string(),
            success: true,
            result: Some(result),
            error: None,
            attempts,
        }
    }

    #[must_use]
    pub fn failed(tool: &str, error: String, attempts: u32) -> Self {
        Self {
            tool: tool.to_string(),
            success: false,
            result: None,
            error: Some(error),
            attempts,
        }
    }

    /// JSON form for merging into the state's tool-result map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Registry of uniquely-named tools plus the retrying execution wrapper.
///
/// Registration happens once at startup; during runs the registry is
/// read-only and shared behind an `Arc`.
pub struct ToolRegistry {
    tools: FxHashMap<String, Arc<dyn Tool>>,
    retry: RetryPolicy,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: FxHashMap::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register a tool. A second registration under an existing name is a
    /// no-op: the attempt is rejected with a warning and `false` is returned.
    pub fn register(&mut self, tool: impl Tool + 'static) -> bool {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            tracing::warn!(tool = %name, "duplicate tool registration rejected");
            return false;
        }
        self.tools.insert(name, Arc::new(tool));
        true
    }

    /// Names of all registered tools.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors for every registered tool, sorted by name.
    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                schema: t.input_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Execute a tool with timeout, bounded retry for transient failures,
    /// and per-attempt logging.
    ///
    /// Terminal errors (bad arguments, auth failure, unknown tool) surface
    /// immediately without consuming retry budget.
    #[instrument(skip(self, args), fields(tool = %name))]
    pub async fn execute(&self, name: &str, args: &Value) -> ToolOutcome {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = %name, "execution requested for unregistered tool");
            return ToolOutcome::failed(name, ToolError::UnknownTool(name.to_string()).to_string(), 0);
        };

        let timeout_secs = tool.timeout_secs();
        let budget = std::time::Duration::from_secs(timeout_secs);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            let outcome = match tokio::time::timeout(budget, tool.execute(args.clone())).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout { timeout_secs }),
            };
            let elapsed = started.elapsed();

            match outcome {
                Ok(result) => {
                    tracing::info!(
                        tool = %name,
                        attempt,
                        duration_ms = elapsed.as_millis() as u64,
                        input = %truncate_preview(&args.to_string(), 120),
                        output = %truncate_preview(&result, 120),
                        "tool call succeeded"
                    );
                    return ToolOutcome::ok(name, result, attempt);
                }
                Err(err) if err.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        tool = %name,
                        attempt,
                        duration_ms = elapsed.as_millis() as u64,
                        input = %truncate_preview(&args.to_string(), 120),
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "transient tool failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        tool = %name,
                        attempt,
                        duration_ms = elapsed.as_millis() as u64,
                        input = %truncate_preview(&args.to_string(), 120),
                        error = %err,
                        transient = err.is_transient(),
                        "tool call failed"
                    );
                    return ToolOutcome::failed(name, err.to_string(), attempt);
                }
            }
        }
    }
}
