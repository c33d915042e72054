//! The language-model backend boundary.
//!
//! The engine never talks to a model vendor directly: callers inject a
//! [`ChatProvider`] at graph construction time. The trait mirrors the two
//! invocation shapes the nodes need (full completion, token stream) plus a
//! tool-binding mode where the reply may carry structured tool-call requests
//! instead of plain text. Whether native streaming exists is an explicit
//! capability flag; the streaming adapter falls back to chunked delivery
//! when it is absent.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::tools::ToolSpec;

/// A full model reply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Completion {
    /// Plain text content (may be empty when the model only requested tools).
    pub content: String,
    /// Structured tool-call requests, when the model chose to call tools.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Completion {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// A structured tool-call request embedded in a model reply.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub args: Value,
}

/// One incremental piece of a streamed reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenChunk {
    pub delta: String,
}

/// Errors surfaced by a provider implementation.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    /// The backend rejected or failed the request.
    #[error("provider backend error: {0}")]
    #[diagnostic(code(dialogos::provider::backend))]
    Backend(String),

    /// The token stream broke mid-reply.
    #[error("provider stream error: {0}")]
    #[diagnostic(code(dialogos::provider::stream))]
    Stream(String),

    /// The provider does not implement the requested capability.
    #[error("provider does not support {0}")]
    #[diagnostic(
        code(dialogos::provider::unsupported),
        help("Check supports_streaming() before calling stream().")
    )]
    Unsupported(&'static str),
}

/// Uniform contract for the language-model backend.
///
/// `invoke` must always work. `stream` is optional: implementations that
/// support token-level delivery return `true` from `supports_streaming` and
/// yield chunks in arrival order; the default errors. `invoke_with_tools`
/// defaults to a plain invoke for backends without a function-calling mode.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Request a complete reply for the given context.
    async fn invoke(&self, messages: &[Message]) -> Result<Completion, ProviderError>;

    /// Request a reply with the given tools bound; the completion may carry
    /// structured tool-call requests instead of (or alongside) text.
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Completion, ProviderError> {
        let _ = tools;
        self.invoke(messages).await
    }

    /// Stream a reply token-by-token. Only meaningful when
    /// [`supports_streaming`](Self::supports_streaming) returns `true`.
    fn stream(&self, messages: &[Message]) -> BoxStream<'_, Result<TokenChunk, ProviderError>> {
        let _ = messages;
        stream::iter([Err(ProviderError::Unsupported("streaming"))]).boxed()
    }

    /// Capability flag for native token streaming.
    fn supports_streaming(&self) -> bool {
        false
    }
}
