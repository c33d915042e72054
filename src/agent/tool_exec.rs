use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::event_bus::OutputEvent;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateSnapshot, StateUpdate};
use crate::tools::ToolRegistry;
use crate::utils::text::extract_urls;

use super::TOOLS;

/// Effect stage: executes every planned tool step through the registry.
///
/// Steps run sequentially; results merge into the state keyed by tool name,
/// so the merged map is deterministic regardless of execution order. A
/// failing tool produces a failed outcome in the map rather than failing
/// the node; one broken tool never takes down the run. Citation URLs found
/// in successful results are collected along the way.
pub struct ToolExecutionNode {
    tools: Arc<ToolRegistry>,
}

impl ToolExecutionNode {
    #[must_use]
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Node for ToolExecutionNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let steps = snapshot
            .plan
            .as_ref()
            .map(|p| p.steps.clone())
            .unwrap_or_default();
        if steps.is_empty() {
            return Err(NodeError::MissingInput {
                what: "plan with tool steps",
            });
        }

        let mut results: FxHashMap<String, Value> = FxHashMap::default();
        let mut citations: Vec<String> = Vec::new();

        for step in &steps {
            // Results are keyed by tool name; a duplicate step would only
            // overwrite itself, so skip re-running it.
            if results.contains_key(&step.tool) {
                continue;
            }

            ctx.emit(OutputEvent::tool_start(&step.tool, step.params.clone()))?;
            let outcome = self.tools.execute(&step.tool, &step.params).await;
            let result_text = outcome
                .result
                .clone()
                .or_else(|| outcome.error.clone())
                .unwrap_or_default();
            ctx.emit(OutputEvent::tool_end(&step.tool, result_text.clone()))?;

            if outcome.success {
                citations.extend(extract_urls(&result_text));
            }
            results.insert(step.tool.clone(), outcome.to_value());
        }

        let executed = results.len();
        Ok(StateUpdate::new()
            .with_tool_results(results)
            .with_citations(citations)
            .with_sender(TOOLS)
            .with_decision("synthesize")
            .with_reasoning(format!("executed {executed} tool step(s)")))
    }
}
