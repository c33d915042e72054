use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Routing function for dynamic transitions.
///
/// Takes the current [`StateSnapshot`] and returns a label, which the engine
/// resolves against the owning edge's label→target table. Routers must be
/// pure functions of the snapshot: no node state, no side effects, so
/// routing decisions stay independently testable.
pub type Router = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A dynamic edge: a router plus its label→target dictionary.
#[derive(Clone)]
pub struct RouterEdge {
    from: NodeKind,
    router: Router,
    targets: FxHashMap<String, NodeKind>,
}

impl RouterEdge {
    pub fn new(
        from: impl Into<NodeKind>,
        router: Router,
        targets: impl IntoIterator<Item = (String, NodeKind)>,
    ) -> Self {
        Self {
            from: from.into(),
            router,
            targets: targets.into_iter().collect(),
        }
    }

    /// The source node of this edge.
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The label→target dictionary.
    pub fn targets(&self) -> &FxHashMap<String, NodeKind> {
        &self.targets
    }

    /// Evaluate the router and resolve the resulting label.
    ///
    /// Returns the chosen label together with the resolved target; `None`
    /// target when the label has no entry in the table.
    pub fn resolve(&self, snapshot: &StateSnapshot) -> (String, Option<NodeKind>) {
        let label = (self.router)(snapshot);
        let target = self.targets.get(&label).cloned();
        (label, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_maps_labels_through_the_table() {
        let edge = RouterEdge::new(
            NodeKind::Custom("grade".into()),
            Arc::new(|s: &StateSnapshot| {
                if s.current_decision.as_deref() == Some("relevant") {
                    "yes".to_string()
                } else {
                    "no".to_string()
                }
            }),
            [
                ("yes".to_string(), NodeKind::Custom("synthesize".into())),
                ("no".to_string(), NodeKind::Custom("rewrite".into())),
            ],
        );

        let mut snapshot = StateSnapshot::default();
        snapshot.current_decision = Some("relevant".to_string());
        let (label, target) = edge.resolve(&snapshot);
        assert_eq!(label, "yes");
        assert_eq!(target, Some(NodeKind::Custom("synthesize".into())));

        snapshot.current_decision = None;
        let (label, target) = edge.resolve(&snapshot);
        assert_eq!(label, "no");
        assert_eq!(target, Some(NodeKind::Custom("rewrite".into())));
    }

    #[test]
    fn unknown_labels_resolve_to_none() {
        let edge = RouterEdge::new(
            NodeKind::Start,
            Arc::new(|_: &StateSnapshot| "missing".to_string()),
            [("known".to_string(), NodeKind::End)],
        );
        let (label, target) = edge.resolve(&StateSnapshot::default());
        assert_eq!(label, "missing");
        assert_eq!(target, None);
    }
}
