use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::provider::ChatProvider;
use crate::state::{StateSnapshot, StateUpdate};
use crate::utils::json_repair::parse_loose;

use super::{GRADE, RETRIEVE_RESULT_KEY};

const GRADING_PROMPT: &str = "You grade whether retrieved documents are \
relevant to a user question. Reply with JSON only: {\"relevant\": true} or \
{\"relevant\": false}.";

/// Grading stage: one model call constrained to a binary verdict.
///
/// Anything that is not a recognizable "yes" (malformed JSON, a missing
/// field, an empty reply) counts as "not relevant": the cycle fails toward
/// doing more work, never toward answering from unverified context.
pub struct GradeNode {
    provider: Arc<dyn ChatProvider>,
}

impl GradeNode {
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }
}

/// Extracts the binary verdict from a grading reply.
pub(crate) fn parse_verdict(content: &str) -> bool {
    if let Some(value) = parse_loose(content) {
        if let Some(flag) = value.get("relevant").and_then(|v| v.as_bool()) {
            return flag;
        }
        if let Some(text) = value.get("relevant").and_then(|v| v.as_str()) {
            return text.eq_ignore_ascii_case("yes") || text.eq_ignore_ascii_case("true");
        }
    }
    let lowered = content.trim().to_lowercase();
    lowered == "yes" || lowered.starts_with("yes,") || lowered.starts_with("yes.")
}

#[async_trait]
impl Node for GradeNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let documents = snapshot
            .tool_results
            .get(RETRIEVE_RESULT_KEY)
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let question = if snapshot.clean_input.is_empty() {
            snapshot.input.as_str()
        } else {
            snapshot.clean_input.as_str()
        };

        let user = format!("Question: {question}\n\nDocuments:\n{documents}");
        let messages = [Message::system(GRADING_PROMPT), Message::user(&user)];
        let completion = self.provider.invoke(&messages).await?;

        let relevant = parse_verdict(&completion.content);
        let decision = if relevant { "relevant" } else { "rewrite" };

        Ok(StateUpdate::new()
            .with_sender(GRADE)
            .with_decision(decision)
            .with_reasoning(format!(
                "graded retrieval pass {} as {}",
                snapshot.research_depth, decision
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_verdicts_parse() {
        assert!(parse_verdict(r#"{"relevant": true}"#));
        assert!(!parse_verdict(r#"{"relevant": false}"#));
        assert!(parse_verdict(r#"{"relevant": "yes"}"#));
        assert!(!parse_verdict(r#"{"relevant": "no"}"#));
    }

    #[test]
    fn bare_yes_no_parse() {
        assert!(parse_verdict("yes"));
        assert!(parse_verdict("Yes."));
        assert!(!parse_verdict("no"));
        assert!(!parse_verdict("No."));
    }

    #[test]
    fn malformed_verdicts_default_to_not_relevant() {
        assert!(!parse_verdict(""));
        assert!(!parse_verdict("maybe?"));
        assert!(!parse_verdict(r#"{"score": 0.7}"#));
        assert!(!parse_verdict("the documents discuss something else"));
    }
}
