use miette::Diagnostic;
use thiserror::Error;

/// Errors a tool invocation can produce.
///
/// The split drives the retry loop: transient failures consume retry budget,
/// terminal failures surface immediately as a failed outcome.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    /// Upstream rate limit; retryable.
    #[error("rate limited: {0}")]
    #[diagnostic(code(dialogos::tools::rate_limited))]
    RateLimited(String),

    /// Upstream returned a response that could not be parsed; retryable.
    #[error("malformed upstream response: {0}")]
    #[diagnostic(code(dialogos::tools::malformed_response))]
    MalformedResponse(String),

    /// Connection reset or other network failure; retryable.
    #[error("network error: {0}")]
    #[diagnostic(code(dialogos::tools::network))]
    Network(String),

    /// The call exceeded its local timeout budget; retryable.
    #[error("tool timed out after {timeout_secs}s")]
    #[diagnostic(code(dialogos::tools::timeout))]
    Timeout { timeout_secs: u64 },

    /// The arguments failed validation; not retryable.
    #[error("invalid arguments: {0}")]
    #[diagnostic(
        code(dialogos::tools::invalid_args),
        help("Check the tool's input schema.")
    )]
    InvalidArgs(String),

    /// Authentication or authorization failed; not retryable.
    #[error("auth failure: {0}")]
    #[diagnostic(code(dialogos::tools::auth))]
    Auth(String),

    /// No tool with that name is registered; not retryable.
    #[error("unknown tool: {0}")]
    #[diagnostic(code(dialogos::tools::unknown))]
    UnknownTool(String),

    /// Any other tool-internal failure; not retryable.
    #[error("tool failed: {0}")]
    #[diagnostic(code(dialogos::tools::failed))]
    Failed(String),
}

impl ToolError {
    /// True for the recognized class of transient errors that may succeed
    /// on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ToolError::RateLimited(_)
                | ToolError::MalformedResponse(_)
                | ToolError::Network(_)
                | ToolError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification_matches_taxonomy() {
        assert!(ToolError::RateLimited("429".into()).is_transient());
        assert!(ToolError::MalformedResponse("bad json".into()).is_transient());
        assert!(ToolError::Network("reset".into()).is_transient());
        assert!(ToolError::Timeout { timeout_secs: 5 }.is_transient());

        assert!(!ToolError::InvalidArgs("missing city".into()).is_transient());
        assert!(!ToolError::Auth("expired key".into()).is_transient());
        assert!(!ToolError::UnknownTool("nope".into()).is_transient());
        assert!(!ToolError::Failed("boom".into()).is_transient());
    }
}
