//! Graph definition and compilation.
//!
//! [`GraphBuilder`] assembles named nodes, static edges, and router edges,
//! then compiles into an executable [`Engine`](crate::engine::Engine).
//! `NodeKind::Start` and `NodeKind::End` are virtual endpoints: the edge out
//! of `Start` selects the entry node, and routing to `End` completes a run.
//!
//! # Quick start
//!
//! ```
//! use dialogos::graph::GraphBuilder;
//! use dialogos::node::{Node, NodeContext, NodeError};
//! use dialogos::state::{StateSnapshot, StateUpdate};
//! use dialogos::types::NodeKind;
//! use async_trait::async_trait;
//!
//! struct EchoNode;
//!
//! #[async_trait]
//! impl Node for EchoNode {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<StateUpdate, NodeError> {
//!         Ok(StateUpdate::new())
//!     }
//! }
//!
//! let engine = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("echo".into()), EchoNode)
//!     .add_edge(NodeKind::Start, NodeKind::Custom("echo".into()))
//!     .add_edge(NodeKind::Custom("echo".into()), NodeKind::End)
//!     .compile()
//!     .expect("valid graph");
//! ```
//!
//! # Router edges
//!
//! A router is a pure function of the state snapshot returning a label; the
//! label is resolved against a per-node label→target table. Keeping routers
//! pure makes routing logic unit-testable without node instances:
//!
//! ```
//! use dialogos::graph::Router;
//! use std::sync::Arc;
//!
//! let after_grade: Router = Arc::new(|snapshot| {
//!     if snapshot.current_decision.as_deref() == Some("relevant") {
//!         "synthesize".to_string()
//!     } else {
//!         "rewrite".to_string()
//!     }
//! });
//! # let _ = after_grade;
//! ```

mod builder;
mod edges;

pub use builder::{GraphBuilder, GraphCompileError};
pub use edges::{Router, RouterEdge};
