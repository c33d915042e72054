use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::event_bus::OutputEvent;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::provider::ChatProvider;
use crate::state::{StateSnapshot, StateUpdate};

use super::SYNTHESIZE;

const SYNTHESIS_PROMPT: &str = "You are the answering stage of an assistant. \
Compose the final reply to the user from the conversation and the gathered \
context below. Be direct and cite sources when URLs are available.";

/// Terminal stage: the final model call that composes the reply.
///
/// When the provider supports native streaming, tokens are forwarded as
/// `TokenDelta` events while they arrive and the accumulated text becomes
/// the final response, so the concatenation of deltas equals the reply
/// exactly. Otherwise a single completion call is made and incremental
/// delivery is left to the streaming adapter's chunked fallback.
pub struct SynthesizeNode {
    provider: Arc<dyn ChatProvider>,
}

impl SynthesizeNode {
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    fn build_context(snapshot: &StateSnapshot) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !snapshot.tool_results.is_empty() {
            let mut lines: Vec<String> = Vec::new();
            let mut keys: Vec<&String> = snapshot.tool_results.keys().collect();
            keys.sort();
            for key in keys {
                let value = &snapshot.tool_results[key];
                let success = value
                    .get("success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                let text = value
                    .get("result")
                    .or_else(|| value.get("error"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let status = if success { "ok" } else { "failed" };
                lines.push(format!("[{key} ({status})] {text}"));
            }
            sections.push(format!("Tool results:\n{}", lines.join("\n")));
        }

        if !snapshot.learned_facts.is_empty() {
            sections.push(format!("Known facts:\n- {}", snapshot.learned_facts.join("\n- ")));
        }

        if !snapshot.citations.is_empty() {
            sections.push(format!("Sources:\n{}", snapshot.citations.join("\n")));
        }

        if let Some(error) = &snapshot.error {
            sections.push(format!(
                "Note: an earlier step failed ({error}); answer with what is available and say so if the answer is incomplete."
            ));
        }

        sections.join("\n\n")
    }
}

#[async_trait]
impl Node for SynthesizeNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let question = if snapshot.clean_input.is_empty() {
            snapshot.input.clone()
        } else {
            snapshot.clean_input.clone()
        };
        let context = Self::build_context(&snapshot);
        let system = if context.is_empty() {
            SYNTHESIS_PROMPT.to_string()
        } else {
            format!("{SYNTHESIS_PROMPT}\n\n{context}")
        };
        // The message channel is the model context; fall back to the bare
        // question only when a caller started with an empty history.
        let mut messages = vec![Message::system(&system)];
        if snapshot.messages.is_empty() {
            messages.push(Message::user(&question));
        } else {
            messages.extend(snapshot.messages.iter().cloned());
        }

        let text = if self.provider.supports_streaming() {
            let mut stream = self.provider.stream(&messages);
            let mut accumulated = String::new();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(chunk) => {
                        ctx.emit(OutputEvent::token_delta(chunk.delta.clone()))?;
                        accumulated.push_str(&chunk.delta);
                    }
                    Err(err) if accumulated.is_empty() => return Err(err.into()),
                    Err(err) => {
                        // Partial reply already delivered; keep it rather
                        // than discarding everything the caller saw.
                        tracing::warn!(error = %err, "token stream broke mid-reply");
                        break;
                    }
                }
            }
            accumulated
        } else {
            self.provider.invoke(&messages).await?.content
        };

        Ok(StateUpdate::new()
            .with_final_response(text.clone())
            .with_messages(vec![Message::assistant(&text)])
            .with_sender(SYNTHESIZE)
            .with_decision("done"))
    }
}
