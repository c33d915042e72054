//! Merge-law tests: scalar idempotence, append-only dedup under replay,
//! key-union semantics for tool results.

use proptest::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::json;

use dialogos::message::Message;
use dialogos::reducers::ReducerRegistry;
use dialogos::state::{AgentState, StateUpdate};

#[test]
fn duplicate_message_ids_are_not_appended_twice() {
    let registry = ReducerRegistry::default();
    let mut state = AgentState::new_with_user_input("question");

    let reply = Message::assistant("the answer");
    let update = StateUpdate::new().with_messages(vec![reply.clone(), reply.clone()]);

    registry.apply_all(&mut state, &update).unwrap();
    assert_eq!(state.messages.len(), 2, "user turn + one deduped assistant turn");

    // Replaying the identical update must not duplicate the entry.
    registry.apply_all(&mut state, &update).unwrap();
    assert_eq!(state.messages.len(), 2);
}

#[test]
fn same_text_different_ids_are_distinct_turns() {
    let registry = ReducerRegistry::default();
    let mut state = AgentState::default();

    let update = StateUpdate::new().with_messages(vec![
        Message::assistant("again"),
        Message::assistant("again"),
    ]);
    registry.apply_all(&mut state, &update).unwrap();
    assert_eq!(state.messages.len(), 2);
}

#[test]
fn tool_results_merge_by_key_union() {
    let registry = ReducerRegistry::default();
    let mut state = AgentState::default();

    let mut first = FxHashMap::default();
    first.insert("weather".to_string(), json!({"temp": 20}));
    first.insert("search".to_string(), json!({"hits": 3}));
    registry
        .apply_all(&mut state, &StateUpdate::new().with_tool_results(first))
        .unwrap();

    let mut second = FxHashMap::default();
    second.insert("weather".to_string(), json!({"temp": 22}));
    second.insert("geo".to_string(), json!({"lat": 48.85}));
    registry
        .apply_all(&mut state, &StateUpdate::new().with_tool_results(second))
        .unwrap();

    assert_eq!(state.tool_results.len(), 3);
    assert_eq!(state.tool_results["weather"], json!({"temp": 22}));
    assert_eq!(state.tool_results["search"], json!({"hits": 3}));
}

#[test]
fn scalars_are_idempotent_under_replay() {
    let registry = ReducerRegistry::default();
    let mut state = AgentState::default();

    let update = StateUpdate::new()
        .with_clean_input("cleaned")
        .with_iteration_count(3)
        .with_final_response("done");

    registry.apply_all(&mut state, &update).unwrap();
    let once = state.clone();
    registry.apply_all(&mut state, &update).unwrap();
    assert_eq!(state, once);
}

#[test]
fn error_field_is_latest_wins() {
    let registry = ReducerRegistry::default();
    let mut state = AgentState::default();

    registry
        .apply_all(&mut state, &StateUpdate::new().with_error("first"))
        .unwrap();
    registry
        .apply_all(&mut state, &StateUpdate::new().with_error("second"))
        .unwrap();
    assert_eq!(state.error.as_deref(), Some("second"));
}

proptest! {
    /// Applying the same update twice leaves the state exactly as applying
    /// it once, for any combination of append-only entries and scalars.
    #[test]
    fn replay_is_a_no_op(
        citations in proptest::collection::vec("[a-z]{1,8}", 0..6),
        facts in proptest::collection::vec("[a-z ]{1,12}", 0..6),
        decision in "[a-z]{1,8}",
        depth in 0u32..10,
    ) {
        let registry = ReducerRegistry::default();
        let update = StateUpdate::new()
            .with_citations(citations)
            .with_facts(facts)
            .with_decision(decision)
            .with_research_depth(depth)
            .with_messages(vec![Message::assistant("stable id")]);

        let mut once = AgentState::default();
        registry.apply_all(&mut once, &update).unwrap();

        let mut twice = AgentState::default();
        registry.apply_all(&mut twice, &update).unwrap();
        registry.apply_all(&mut twice, &update).unwrap();

        prop_assert_eq!(once, twice);
    }
}
