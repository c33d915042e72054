use async_trait::async_trait;

use crate::node::{Node, NodeContext, NodeError};
use crate::state::{Plan, PlanStep, StateSnapshot, StateUpdate};

use super::ANALYZE;

/// Hashtag directive → forced tool name.
///
/// Users can pin a tool with an inline hashtag (`#web what's new in rust`);
/// the directive is stripped from the prompt text and the tool survives
/// planning unconditionally.
const HASHTAG_TOOLS: &[(&str, &str)] = &[
    ("#search", "search_documents"),
    ("#read", "read_file"),
    ("#write", "write_file"),
    ("#web", "web_search"),
    ("#brave", "brave_search"),
    ("#dir", "list_directory"),
];

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "yo",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
    "how are you",
];

/// Splits hashtag directives out of the raw input.
///
/// Returns the cleaned text and the forced tool names, deduplicated in
/// first-seen order.
pub(crate) fn parse_directives(input: &str) -> (String, Vec<String>) {
    let mut forced: Vec<String> = Vec::new();
    let mut kept: Vec<&str> = Vec::new();
    for token in input.split_whitespace() {
        match HASHTAG_TOOLS
            .iter()
            .find(|(tag, _)| token.eq_ignore_ascii_case(tag))
        {
            Some((_, tool)) => {
                if !forced.iter().any(|t| t == tool) {
                    forced.push((*tool).to_string());
                }
            }
            None => kept.push(token),
        }
    }
    (kept.join(" "), forced)
}

/// True for trivial social inputs that deserve a direct reply, skipping the
/// planning call entirely.
pub(crate) fn is_simple_greeting(input: &str) -> bool {
    let lowered = input
        .trim()
        .trim_end_matches(['!', '.', '?'])
        .to_lowercase();
    GREETINGS.iter().any(|g| lowered == *g)
}

/// First stage: strips directives, cleans the input, and decides whether
/// the request needs planning at all.
pub struct AnalyzeNode;

#[async_trait]
impl Node for AnalyzeNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let (clean, forced) = parse_directives(&snapshot.input);
        let clean = if clean.is_empty() {
            snapshot.input.clone()
        } else {
            clean
        };

        let decision = if forced.is_empty() && is_simple_greeting(&clean) {
            "respond"
        } else {
            "plan"
        };

        let mut update = StateUpdate::new()
            .with_clean_input(clean)
            .with_sender(ANALYZE)
            .with_decision(decision);

        if !forced.is_empty() {
            update = update
                .with_plan(Plan {
                    intent: String::new(),
                    steps: forced.iter().map(|t| PlanStep::forced(t)).collect(),
                    reasoning: "tools pinned by input directives".to_string(),
                })
                .with_reasoning(format!("input directives forced tools: {}", forced.join(", ")));
        }

        Ok(update)
    }
}
