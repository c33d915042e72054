use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use parking_lot::Mutex;

use dialogos::message::Message;
use dialogos::provider::{ChatProvider, Completion, ProviderError, TokenChunk};
use dialogos::tools::ToolSpec;

/// Provider double that replays a scripted sequence of completions.
///
/// Each `invoke`/`invoke_with_tools` call pops the next reply; an exhausted
/// script surfaces a backend error, which makes over-calling visible in
/// tests. Optionally streams a fixed chunk sequence.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Completion>>,
    stream_chunks: Option<Vec<String>>,
    calls: Mutex<u32>,
}

impl ScriptedProvider {
    pub fn with_replies(replies: impl IntoIterator<Item = Completion>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            stream_chunks: None,
            calls: Mutex::new(0),
        }
    }

    pub fn with_text_replies(texts: impl IntoIterator<Item = &'static str>) -> Self {
        Self::with_replies(texts.into_iter().map(|t| Completion::text(t)))
    }

    /// A streaming provider: every `stream` call yields these chunks.
    pub fn streaming(chunks: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            stream_chunks: Some(chunks.into_iter().map(str::to_string).collect()),
            calls: Mutex::new(0),
        }
    }

    /// Number of invoke-style calls made so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn invoke(&self, _messages: &[Message]) -> Result<Completion, ProviderError> {
        *self.calls.lock() += 1;
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| ProviderError::Backend("scripted replies exhausted".to_string()))
    }

    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<Completion, ProviderError> {
        self.invoke(messages).await
    }

    fn stream(&self, _messages: &[Message]) -> BoxStream<'_, Result<TokenChunk, ProviderError>> {
        let chunks = self.stream_chunks.clone().unwrap_or_default();
        Box::pin(async_stream::stream! {
            for delta in chunks {
                yield Ok(TokenChunk { delta });
            }
        })
    }

    fn supports_streaming(&self) -> bool {
        self.stream_chunks.is_some()
    }
}

/// Provider double that always fails, for node-failure paths.
pub struct FailingProvider;

#[async_trait]
impl ChatProvider for FailingProvider {
    async fn invoke(&self, _messages: &[Message]) -> Result<Completion, ProviderError> {
        Err(ProviderError::Backend("model unavailable".to_string()))
    }
}
