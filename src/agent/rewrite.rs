use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::provider::ChatProvider;
use crate::state::{StateSnapshot, StateUpdate};

use super::REWRITE;

const REWRITE_PROMPT: &str = "The previous search query retrieved documents \
that were not relevant. Rewrite the query to better express the underlying \
information need. Reply with the rewritten query only, no commentary.";

/// Rewrite stage of the retrieval cycle: reformulates the query after a
/// failed grade, then hands control back to planning.
pub struct RewriteNode {
    provider: Arc<dyn ChatProvider>,
}

impl RewriteNode {
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for RewriteNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let current = if snapshot.clean_input.is_empty() {
            snapshot.input.as_str()
        } else {
            snapshot.clean_input.as_str()
        };

        let messages = [
            Message::system(REWRITE_PROMPT),
            Message::user(&format!("Original query: {current}")),
        ];
        let completion = self.provider.invoke(&messages).await?;

        let rewritten = completion.content.trim().trim_matches('"').to_string();
        // An empty rewrite keeps the old query rather than wiping it.
        let next_query = if rewritten.is_empty() {
            current.to_string()
        } else {
            rewritten
        };

        Ok(StateUpdate::new()
            .with_clean_input(next_query.clone())
            .with_sender(REWRITE)
            .with_iteration_count(snapshot.iteration_count + 1)
            .with_reasoning(format!("rewrote query to: {next_query}")))
    }
}
