//! Engine behavior: termination, routing, ceiling enforcement, and
//! node-failure capture.

mod common;

use std::sync::Arc;

use common::nodes::{AnswerNode, FailNode, NoopNode, SayNode, VisitNode};
use dialogos::config::RuntimeConfig;
use dialogos::event_bus::OutputEvent;
use dialogos::graph::{GraphBuilder, GraphCompileError, Router};
use dialogos::state::{AgentState, StateSnapshot};
use dialogos::types::NodeKind;

fn node(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

fn started_nodes(events: &[OutputEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            OutputEvent::Progress { node, status } if status == "started" => Some(node.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn linear_graph_runs_to_completion() {
    let engine = GraphBuilder::new()
        .add_node(node("say"), SayNode::new("working"))
        .add_node(node("answer"), AnswerNode::new("all done"))
        .add_edge(NodeKind::Start, node("say"))
        .add_edge(node("say"), node("answer"))
        .add_edge(node("answer"), NodeKind::End)
        .compile()
        .unwrap();

    let state = engine
        .run(AgentState::new_with_user_input("go"))
        .await
        .unwrap();
    assert_eq!(state.final_response.as_deref(), Some("all done"));
    assert_eq!(state.messages.len(), 3); // user + say + answer
    assert!(state.error.is_none());
}

#[tokio::test]
async fn router_picks_branch_from_state() {
    let route: Router = Arc::new(|s: &StateSnapshot| {
        if s.input.contains("left") {
            "left".to_string()
        } else {
            "right".to_string()
        }
    });

    let engine = GraphBuilder::new()
        .add_node(node("fork"), NoopNode)
        .add_node(node("left"), AnswerNode::new("went left"))
        .add_node(node("right"), AnswerNode::new("went right"))
        .add_edge(NodeKind::Start, node("fork"))
        .add_router(
            node("fork"),
            route,
            [("left", node("left")), ("right", node("right"))],
        )
        .add_edge(node("left"), NodeKind::End)
        .add_edge(node("right"), NodeKind::End)
        .compile()
        .unwrap();

    let state = engine
        .run(AgentState::new_with_user_input("turn left here"))
        .await
        .unwrap();
    assert_eq!(state.final_response.as_deref(), Some("went left"));

    let state = engine
        .run(AgentState::new_with_user_input("anything else"))
        .await
        .unwrap();
    assert_eq!(state.final_response.as_deref(), Some("went right"));
}

#[tokio::test]
async fn cycle_is_bounded_by_iteration_ceiling() {
    // a -> b -> a, forever; only the ceiling stops it.
    let config = RuntimeConfig::default().with_max_iterations(6);
    let engine = GraphBuilder::new()
        .with_config(config)
        .add_node(node("a"), VisitNode::new("a"))
        .add_node(node("b"), VisitNode::new("b"))
        .add_node(node("wrap_up"), AnswerNode::new("best effort"))
        .add_edge(NodeKind::Start, node("a"))
        .add_edge(node("a"), node("b"))
        .add_edge(node("b"), node("a"))
        .add_edge(node("wrap_up"), NodeKind::End)
        .set_fallback(node("wrap_up"))
        .compile()
        .unwrap();

    let (handle, events) = engine.run_streaming(AgentState::new_with_user_input("loop"));
    let events = events.collect_all().await;
    let state = handle.join().await.unwrap();

    let started = started_nodes(&events);
    // Ceiling + one forced terminal transition at most.
    assert!(started.len() <= 7, "ran {} nodes: {:?}", started.len(), started);
    assert_eq!(started.last().map(String::as_str), Some("wrap_up"));
    assert_eq!(state.final_response.as_deref(), Some("best effort"));
}

#[tokio::test]
async fn cycle_without_fallback_still_terminates() {
    let config = RuntimeConfig::default().with_max_iterations(4);
    let engine = GraphBuilder::new()
        .with_config(config)
        .add_node(node("a"), NoopNode)
        .add_node(node("b"), NoopNode)
        .add_edge(NodeKind::Start, node("a"))
        .add_edge(node("a"), node("b"))
        .add_edge(node("b"), node("a"))
        .compile()
        .unwrap();

    let (handle, events) = engine.run_streaming(AgentState::new_with_user_input("loop"));
    let events = events.collect_all().await;
    let state = handle.join().await.unwrap();

    assert!(started_nodes(&events).len() <= 4);
    assert!(state.final_response.is_none());
    // No answer, no error: the terminal event is an empty Final.
    assert_eq!(
        events.last(),
        Some(&OutputEvent::Final {
            text: String::new()
        })
    );
}

#[tokio::test]
async fn node_failure_is_captured_and_run_reaches_fallback() {
    let engine = GraphBuilder::new()
        .add_node(node("broken"), FailNode)
        .add_node(node("recover"), AnswerNode::new("partial answer"))
        .add_edge(NodeKind::Start, node("broken"))
        .add_edge(node("broken"), NodeKind::End)
        .add_edge(node("recover"), NodeKind::End)
        .set_fallback(node("recover"))
        .compile()
        .unwrap();

    let (handle, events) = engine.run_streaming(AgentState::new_with_user_input("go"));
    let events = events.collect_all().await;
    let state = handle.join().await.unwrap();

    assert!(state.error.as_deref().unwrap().contains("deliberate failure"));
    assert!(
        state
            .reasoning_chain
            .iter()
            .any(|entry| entry.contains("broken failed"))
    );
    assert_eq!(state.final_response.as_deref(), Some("partial answer"));

    assert!(events.contains(&OutputEvent::progress("broken", "failed")));
    assert_eq!(
        events.last(),
        Some(&OutputEvent::Final {
            text: "partial answer".to_string()
        })
    );
}

#[tokio::test]
async fn failure_without_fallback_emits_terminal_error() {
    let engine = GraphBuilder::new()
        .add_node(node("broken"), FailNode)
        .add_edge(NodeKind::Start, node("broken"))
        .add_edge(node("broken"), NodeKind::End)
        .compile()
        .unwrap();

    let (handle, events) = engine.run_streaming(AgentState::new_with_user_input("go"));
    let events = events.collect_all().await;
    let state = handle.join().await.unwrap();

    assert!(state.error.is_some());
    assert!(matches!(
        events.last(),
        Some(OutputEvent::Error { message }) if message.contains("deliberate failure")
    ));
}

#[tokio::test]
async fn streaming_run_ends_with_exactly_one_terminal_event() {
    let engine = GraphBuilder::new()
        .add_node(node("answer"), AnswerNode::new("hi"))
        .add_edge(NodeKind::Start, node("answer"))
        .add_edge(node("answer"), NodeKind::End)
        .compile()
        .unwrap();

    let (handle, events) = engine.run_streaming(AgentState::new_with_user_input("go"));
    let events = events.collect_all().await;
    handle.join().await.unwrap();

    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1);
    assert!(events.last().unwrap().is_terminal());
}

#[test]
fn compile_rejects_missing_entry_edge() {
    let result = GraphBuilder::new()
        .add_node(node("only"), NoopNode)
        .add_edge(node("only"), NodeKind::End)
        .compile();
    assert!(matches!(result, Err(GraphCompileError::MissingEntryEdge)));
}

#[test]
fn compile_rejects_unknown_edge_target() {
    let result = GraphBuilder::new()
        .add_node(node("a"), NoopNode)
        .add_edge(NodeKind::Start, node("a"))
        .add_edge(node("a"), node("ghost"))
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownEdgeTarget { .. })
    ));
}

#[test]
fn compile_rejects_unknown_router_target() {
    let route: Router = Arc::new(|_| "x".to_string());
    let result = GraphBuilder::new()
        .add_node(node("a"), NoopNode)
        .add_edge(NodeKind::Start, node("a"))
        .add_router(node("a"), route, [("x", node("ghost"))])
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownRouteTarget { .. })
    ));
}

#[test]
fn compile_rejects_unregistered_fallback() {
    let result = GraphBuilder::new()
        .add_node(node("a"), NoopNode)
        .add_edge(NodeKind::Start, node("a"))
        .add_edge(node("a"), NodeKind::End)
        .set_fallback(node("ghost"))
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownFallback { .. })
    ));
}
