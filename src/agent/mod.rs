//! The prebuilt conversational-agent pipeline.
//!
//! Node implementations for the multi-stage reply flow (understand the
//! utterance, plan tool use, execute tools, grade retrieved context,
//! rewrite and retry, synthesize the reply) plus the pure routing
//! functions and the graph wiring that assembles them into an
//! [`Engine`](crate::engine::Engine).
//!
//! Stage order for a tool-using request:
//! `analyze → plan → tools|retrieve → (grade → rewrite → plan)* → synthesize`.
//! Trivial greetings short-circuit straight to synthesis, spending one model
//! call instead of two.

mod analyze;
mod grade;
mod graph;
mod plan;
mod retrieve;
mod rewrite;
pub mod routers;
mod synthesize;
mod tool_exec;

pub use analyze::AnalyzeNode;
pub use grade::GradeNode;
pub use graph::agent_graph;
pub use plan::PlanNode;
pub use retrieve::RetrieveNode;
pub use rewrite::RewriteNode;
pub use synthesize::SynthesizeNode;
pub use tool_exec::ToolExecutionNode;

/// Node names used by the prebuilt graph.
pub const ANALYZE: &str = "analyze";
pub const PLAN: &str = "plan";
pub const TOOLS: &str = "tools";
pub const RETRIEVE: &str = "retrieve";
pub const GRADE: &str = "grade";
pub const REWRITE: &str = "rewrite";
pub const SYNTHESIZE: &str = "synthesize";

/// Tool name the retrieval cycle is built around.
pub const RETRIEVAL_TOOL: &str = "search_documents";

/// Key under which the latest retrieval outcome lands in `tool_results`.
pub const RETRIEVE_RESULT_KEY: &str = "retrieve";
