use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

use super::edges::{Router, RouterEdge};
use crate::config::RuntimeConfig;
use crate::engine::Engine;
use crate::node::Node;
use crate::types::NodeKind;

/// Builder for workflow graphs.
///
/// Each node maps to either a single fixed successor
/// ([`add_edge`](Self::add_edge)) or a router
/// ([`add_router`](Self::add_router)); registering both for one node lets
/// the static edge act as the fallback when the router label resolves to
/// nothing. Every graph needs an edge out of `Start`.
pub struct GraphBuilder {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, NodeKind>,
    routers: FxHashMap<NodeKind, RouterEdge>,
    fallback: Option<NodeKind>,
    config: RuntimeConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            routers: FxHashMap::default(),
            fallback: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Registers a node. `Start` and `End` are virtual and cannot be
    /// registered; such attempts are ignored with a warning.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(?id, "ignoring registration of virtual node kind");
            }
            _ => {
                self.nodes.insert(id, Arc::new(node));
            }
        }
        self
    }

    /// Adds a static edge: when `from` completes, `to` runs next.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.insert(from, to);
        self
    }

    /// Adds a router edge: after `from`, the router's label picks the
    /// successor from `targets`.
    #[must_use]
    pub fn add_router(
        mut self,
        from: NodeKind,
        router: Router,
        targets: impl IntoIterator<Item = (&'static str, NodeKind)>,
    ) -> Self {
        let targets = targets
            .into_iter()
            .map(|(label, target)| (label.to_string(), target));
        self.routers
            .insert(from.clone(), RouterEdge::new(from, router, targets));
        self
    }

    /// Names the node the engine forces a transition to when the iteration
    /// ceiling is reached or a node fails; typically the synthesis node, so
    /// partial progress still yields an answer. Unset, the engine routes
    /// straight to `End`.
    #[must_use]
    pub fn set_fallback(mut self, node: NodeKind) -> Self {
        self.fallback = Some(node);
        self
    }

    /// Overrides the default runtime configuration.
    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the graph and produces an executable engine.
    pub fn compile(self) -> Result<Engine, GraphCompileError> {
        let entry = self
            .edges
            .get(&NodeKind::Start)
            .cloned()
            .ok_or(GraphCompileError::MissingEntryEdge)?;

        let known = |kind: &NodeKind| -> bool {
            match kind {
                NodeKind::Start | NodeKind::End => true,
                custom => self.nodes.contains_key(custom),
            }
        };

        if !known(&entry) {
            return Err(GraphCompileError::UnknownEdgeTarget {
                from: NodeKind::Start.to_string(),
                to: entry.to_string(),
            });
        }

        for (from, to) in &self.edges {
            if !known(to) {
                return Err(GraphCompileError::UnknownEdgeTarget {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }

        for (from, edge) in &self.routers {
            if edge.targets().is_empty() {
                return Err(GraphCompileError::EmptyRouteTable {
                    from: from.to_string(),
                });
            }
            for (label, target) in edge.targets() {
                if !known(target) {
                    return Err(GraphCompileError::UnknownRouteTarget {
                        from: from.to_string(),
                        label: label.clone(),
                        to: target.to_string(),
                    });
                }
            }
        }

        if let Some(fallback) = &self.fallback
            && !self.nodes.contains_key(fallback)
        {
            return Err(GraphCompileError::UnknownFallback {
                node: fallback.to_string(),
            });
        }

        Ok(Engine::from_parts(
            self.nodes,
            self.edges,
            self.routers,
            self.fallback,
            self.config,
        ))
    }
}

/// Structural problems detected at compile time.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    #[error("no edge out of Start; the graph has no entry node")]
    #[diagnostic(
        code(dialogos::graph::missing_entry),
        help("Add an edge from NodeKind::Start to the first node.")
    )]
    MissingEntryEdge,

    #[error("edge {from} -> {to} targets an unregistered node")]
    #[diagnostic(code(dialogos::graph::unknown_edge_target))]
    UnknownEdgeTarget { from: String, to: String },

    #[error("router on {from} maps label {label:?} to unregistered node {to}")]
    #[diagnostic(code(dialogos::graph::unknown_route_target))]
    UnknownRouteTarget {
        from: String,
        label: String,
        to: String,
    },

    #[error("router on {from} has an empty label table")]
    #[diagnostic(code(dialogos::graph::empty_route_table))]
    EmptyRouteTable { from: String },

    #[error("fallback node {node} is not registered")]
    #[diagnostic(code(dialogos::graph::unknown_fallback))]
    UnknownFallback { node: String },
}
