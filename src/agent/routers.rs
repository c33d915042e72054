//! Pure routing functions for the prebuilt graph.
//!
//! Each router is a plain function of the state snapshot returning a label;
//! the graph wiring maps labels to nodes. No node state and no side effects,
//! routing decisions are unit-testable in isolation.

use crate::state::StateSnapshot;

use super::RETRIEVAL_TOOL;

/// After analyze: trivial inputs answer directly, everything else plans.
#[must_use]
pub fn after_analyze(snapshot: &StateSnapshot) -> &'static str {
    match snapshot.current_decision.as_deref() {
        Some("respond") => "respond",
        _ => "plan",
    }
}

/// After plan: no steps answers directly; a planned retrieval step enters
/// the grading cycle; anything else goes to plain tool execution.
#[must_use]
pub fn after_plan(snapshot: &StateSnapshot) -> &'static str {
    let Some(plan) = &snapshot.plan else {
        return "respond";
    };
    if plan.steps.is_empty() {
        return "respond";
    }
    if plan.steps.iter().any(|s| s.tool == RETRIEVAL_TOOL) {
        return "retrieve";
    }
    "tools"
}

/// After grade: relevant context synthesizes; irrelevant context rewrites,
/// unless the opt-in research-depth bound is exhausted, in which case the
/// run answers with what it has.
#[must_use]
pub fn after_grade(snapshot: &StateSnapshot, max_research_depth: u32) -> &'static str {
    if snapshot.current_decision.as_deref() == Some("relevant") {
        return "relevant";
    }
    if snapshot.research_depth >= max_research_depth {
        return "exhausted";
    }
    "rewrite"
}
