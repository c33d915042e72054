use async_trait::async_trait;

use dialogos::message::Message;
use dialogos::node::{Node, NodeContext, NodeError};
use dialogos::state::{StateSnapshot, StateUpdate};

/// Appends one assistant message.
#[derive(Debug, Clone)]
pub struct SayNode {
    pub text: &'static str,
}

impl SayNode {
    pub fn new(text: &'static str) -> Self {
        Self { text }
    }
}

#[async_trait]
impl Node for SayNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        Ok(StateUpdate::new().with_messages(vec![Message::assistant(self.text)]))
    }
}

/// Records a visit in the reasoning chain; useful for asserting node order.
#[derive(Debug, Clone)]
pub struct VisitNode {
    pub name: &'static str,
}

impl VisitNode {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Node for VisitNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        Ok(StateUpdate::new()
            .with_reasoning(format!("visit:{}:{}", self.name, snapshot.reasoning_chain.len())))
    }
}

/// Always fails.
#[derive(Debug, Clone)]
pub struct FailNode;

#[async_trait]
impl Node for FailNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        Err(NodeError::ValidationFailed("deliberate failure".to_string()))
    }
}

/// Sets the final response.
#[derive(Debug, Clone)]
pub struct AnswerNode {
    pub text: String,
}

impl AnswerNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Node for AnswerNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        Ok(StateUpdate::new()
            .with_final_response(self.text.clone())
            .with_messages(vec![Message::assistant(&self.text)]))
    }
}

/// Does nothing; building block for cycles.
#[derive(Debug, Clone)]
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        Ok(StateUpdate::default())
    }
}
