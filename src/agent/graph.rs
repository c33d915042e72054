use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::engine::Engine;
use crate::graph::{GraphBuilder, GraphCompileError};
use crate::provider::ChatProvider;
use crate::tools::ToolRegistry;
use crate::types::NodeKind;

use super::{
    ANALYZE, AnalyzeNode, GRADE, GradeNode, PLAN, PlanNode, RETRIEVE, REWRITE, RetrieveNode,
    RewriteNode, SYNTHESIZE, SynthesizeNode, TOOLS, ToolExecutionNode, routers,
};

fn node(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

/// Wires the full reply pipeline into an executable engine.
///
/// ```text
///            Start
///              │
///           analyze ──respond──────────────┐
///              │plan                       │
///            plan ──respond────────────────┤
///          ┌───┴───┐                       │
///      retrieve   tools ───────────────────┤
///          │                               │
///        grade ──relevant/exhausted────────┤
///          │rewrite                        │
///       rewrite ──► plan (cycle)      synthesize ──► End
/// ```
///
/// The cycle has no counter of its own: the engine's global iteration
/// ceiling bounds it, with `synthesize` as the forced-terminal fallback so
/// an over-long run still answers from accumulated state. The grade router
/// additionally honors `max_research_depth` as an opt-in stricter bound.
pub fn agent_graph(
    provider: Arc<dyn ChatProvider>,
    tools: Arc<ToolRegistry>,
    config: RuntimeConfig,
) -> Result<Engine, GraphCompileError> {
    let max_research_depth = config.max_research_depth;

    GraphBuilder::new()
        .with_config(config)
        .add_node(node(ANALYZE), AnalyzeNode)
        .add_node(node(PLAN), PlanNode::new(provider.clone(), tools.clone()))
        .add_node(node(TOOLS), ToolExecutionNode::new(tools.clone()))
        .add_node(node(RETRIEVE), RetrieveNode::new(tools))
        .add_node(node(GRADE), GradeNode::new(provider.clone()))
        .add_node(node(REWRITE), RewriteNode::new(provider.clone()))
        .add_node(node(SYNTHESIZE), SynthesizeNode::new(provider))
        .add_edge(NodeKind::Start, node(ANALYZE))
        .add_router(
            node(ANALYZE),
            Arc::new(|s| routers::after_analyze(s).to_string()),
            [("respond", node(SYNTHESIZE)), ("plan", node(PLAN))],
        )
        .add_router(
            node(PLAN),
            Arc::new(|s| routers::after_plan(s).to_string()),
            [
                ("respond", node(SYNTHESIZE)),
                ("retrieve", node(RETRIEVE)),
                ("tools", node(TOOLS)),
            ],
        )
        .add_edge(node(TOOLS), node(SYNTHESIZE))
        .add_edge(node(RETRIEVE), node(GRADE))
        .add_router(
            node(GRADE),
            Arc::new(move |s| routers::after_grade(s, max_research_depth).to_string()),
            [
                ("relevant", node(SYNTHESIZE)),
                ("exhausted", node(SYNTHESIZE)),
                ("rewrite", node(REWRITE)),
            ],
        )
        .add_edge(node(REWRITE), node(PLAN))
        .add_edge(node(SYNTHESIZE), NodeKind::End)
        .set_fallback(node(SYNTHESIZE))
        .compile()
}
