//! # Dialogos: conversational-agent orchestration engine
//!
//! Dialogos drives a multi-stage reply pipeline (understand intent, plan,
//! call external tools, grade and refine retrieved context, synthesize)
//! as a directed graph of async nodes over a field-wise-merged state
//! record, with a live stream of output events for the caller.
//!
//! ## Core Concepts
//!
//! - **Nodes**: async units of work receiving a state snapshot and
//!   returning a partial update
//! - **State**: one record per run, merged field-by-field through reducers
//! - **Graph**: static edges plus pure-function routers, compiled into an
//!   executable engine
//! - **Engine**: sequential executor with a global iteration ceiling and
//!   node-failure capture; a run always terminates with an answer or an
//!   explicit error
//! - **Streaming**: ordered output events (progress, token deltas, tool
//!   boundaries, side-channel payloads, final text)
//! - **Tools**: a read-only registry with per-call timeout and bounded
//!   retry for transient failures
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dialogos::agent::agent_graph;
//! use dialogos::config::RuntimeConfig;
//! use dialogos::provider::ChatProvider;
//! use dialogos::state::AgentState;
//! use dialogos::stream::StreamingAdapter;
//! use dialogos::tools::ToolRegistry;
//!
//! # async fn example(provider: Arc<dyn ChatProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let tools = Arc::new(ToolRegistry::new());
//! let engine = agent_graph(provider.clone(), tools, RuntimeConfig::default())?;
//!
//! // Blocking: run to completion.
//! let final_state = engine
//!     .run(AgentState::new_with_user_input("What's the weather in Paris?"))
//!     .await?;
//! println!("{}", final_state.final_response.unwrap_or_default());
//!
//! // Streaming: consume events as they happen.
//! let adapter = StreamingAdapter::for_provider(engine, provider.as_ref());
//! let mut reply = adapter.run(AgentState::new_with_user_input("And in Rome?"));
//! while let Some(event) = reply.recv().await {
//!     println!("{event}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`message`] - Role-tagged conversation turns
//! - [`state`] - The state record, snapshots, and partial updates
//! - [`reducers`] - Per-field merge strategies
//! - [`node`] - The node contract and execution context
//! - [`graph`] - Graph definition and compilation
//! - [`engine`] - The executor
//! - [`event_bus`] - Output events, sinks, and subscriptions
//! - [`stream`] - The streaming adapter (native and chunked delivery)
//! - [`tools`] - Tool trait, registry, and retry
//! - [`provider`] - The language-model backend boundary
//! - [`agent`] - The prebuilt reply pipeline
//! - [`config`] - Runtime configuration
//! - [`telemetry`] - Formatting and tracing setup

pub mod agent;
pub mod config;
pub mod engine;
pub mod event_bus;
pub mod graph;
pub mod message;
pub mod node;
pub mod provider;
pub mod reducers;
pub mod state;
pub mod stream;
pub mod telemetry;
pub mod tools;
pub mod types;
pub mod utils;
