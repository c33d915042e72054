use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use crate::event_bus::OutputEvent;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateSnapshot, StateUpdate};
use crate::tools::ToolRegistry;
use crate::utils::text::extract_urls;

use super::{RETRIEVAL_TOOL, RETRIEVE, RETRIEVE_RESULT_KEY};

/// Effect stage of the retrieval cycle: runs the document-retrieval tool
/// with the current (possibly rewritten) query.
///
/// The outcome always lands under the same key, so each pass of the cycle
/// overwrites the previous documents and the grade stage only ever sees the
/// latest retrieval. `research_depth` counts the passes.
pub struct RetrieveNode {
    tools: Arc<ToolRegistry>,
    tool_name: String,
}

impl RetrieveNode {
    #[must_use]
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            tool_name: RETRIEVAL_TOOL.to_string(),
        }
    }

    /// Retrieve through a differently-named tool.
    #[must_use]
    pub fn with_tool_name(mut self, tool_name: &str) -> Self {
        self.tool_name = tool_name.to_string();
        self
    }
}

#[async_trait]
impl Node for RetrieveNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let query = if snapshot.clean_input.is_empty() {
            snapshot.input.clone()
        } else {
            snapshot.clean_input.clone()
        };
        let args = json!({"query": query});

        ctx.emit(OutputEvent::tool_start(&self.tool_name, args.clone()))?;
        let outcome = self.tools.execute(&self.tool_name, &args).await;
        let result_text = outcome
            .result
            .clone()
            .or_else(|| outcome.error.clone())
            .unwrap_or_default();
        ctx.emit(OutputEvent::tool_end(&self.tool_name, result_text.clone()))?;

        let mut results: FxHashMap<String, Value> = FxHashMap::default();
        results.insert(RETRIEVE_RESULT_KEY.to_string(), outcome.to_value());

        let citations = if outcome.success {
            extract_urls(&result_text)
        } else {
            Vec::new()
        };

        Ok(StateUpdate::new()
            .with_tool_results(results)
            .with_citations(citations)
            .with_research_depth(snapshot.research_depth + 1)
            .with_sender(RETRIEVE)
            .with_reasoning(format!(
                "retrieval pass {} for query: {}",
                snapshot.research_depth + 1,
                query
            )))
    }
}
