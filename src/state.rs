//! The state record threaded through a graph run.
//!
//! [`AgentState`] is the single mutable value a run owns. Nodes never touch
//! it directly: they receive a [`StateSnapshot`] and return a [`StateUpdate`]
//! (one optional slot per field), which the engine merges through the
//! reducer registry. The record is created fresh per request and discarded
//! once the terminal output has been delivered; conversation-level
//! persistence belongs to the caller.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;

/// A structured execution plan produced by the planning node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// What the model believes the user wants.
    #[serde(default)]
    pub intent: String,
    /// Tool invocations to perform, in order.
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    /// Free-text justification for the plan.
    #[serde(default)]
    pub reasoning: String,
}

/// One planned tool invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Registered tool name.
    pub tool: String,
    /// Arguments forwarded to the tool.
    #[serde(default)]
    pub params: Value,
    /// True when the step was forced by an input directive rather than
    /// chosen by the model; forced steps always survive replanning.
    #[serde(default)]
    pub forced: bool,
}

impl PlanStep {
    #[must_use]
    pub fn forced(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            params: Value::Null,
            forced: true,
        }
    }
}

/// The shared record threaded through one graph run.
///
/// Field merge rules (applied when a [`StateUpdate`] arrives):
/// - `input`, `clean_input`, `sender`, `current_decision`, `final_response`,
///   `error`, and both counters: latest writer wins.
/// - `messages`: append-only, deduplicated by message id.
/// - `plan`: latest writer wins.
/// - `tool_results`: key union; existing keys are overwritten.
/// - `citations`, `reasoning_chain`, `learned_facts`: append-only,
///   deduplicated by value.
///
/// # Examples
///
/// ```
/// use dialogos::state::AgentState;
///
/// let state = AgentState::new_with_user_input("What's the weather in Paris?");
/// assert_eq!(state.messages.len(), 1);
/// assert_eq!(state.clean_input, state.input);
/// assert_eq!(state.iteration_count, 0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// The raw user utterance as submitted.
    pub input: String,
    /// The utterance with control directives stripped; what prompts use.
    pub clean_input: String,
    /// Conversation turns accumulated during the run.
    pub messages: Vec<Message>,
    /// Current execution plan, if one has been produced.
    pub plan: Option<Plan>,
    /// Tool name → structured outcome.
    pub tool_results: FxHashMap<String, Value>,
    /// Source URLs extracted from tool results.
    pub citations: Vec<String>,
    /// Human-readable trace of decisions taken during the run.
    pub reasoning_chain: Vec<String>,
    /// Facts extracted along the way, available to the synthesis prompt.
    pub learned_facts: Vec<String>,
    /// Number of retrieval passes performed.
    pub research_depth: u32,
    /// Number of plan/rewrite iterations performed.
    pub iteration_count: u32,
    /// Name of the node that wrote last; a routing hint.
    pub sender: Option<String>,
    /// The most recent routing decision label.
    pub current_decision: Option<String>,
    /// The reply delivered to the caller; set by the synthesis node only.
    pub final_response: Option<String>,
    /// Node-local failure message; presence means a node failed but the run
    /// carried on to the terminal node.
    pub error: Option<String>,
}

/// Immutable view of the state handed to nodes and routers.
///
/// The engine clones the record at each step; nodes can read freely and the
/// engine's copy stays untouched until the returned update is merged.
pub type StateSnapshot = AgentState;

impl AgentState {
    /// Creates a fresh record for one incoming request.
    ///
    /// Seeds `input`, `clean_input`, and the first user message.
    #[must_use]
    pub fn new_with_user_input(input: &str) -> Self {
        Self {
            input: input.to_string(),
            clean_input: input.to_string(),
            messages: vec![Message::user(input)],
            ..Default::default()
        }
    }

    /// Builder for states with history or pre-seeded metadata.
    ///
    /// ```
    /// use dialogos::state::AgentState;
    ///
    /// let state = AgentState::builder()
    ///     .with_system_message("You are a concise assistant.")
    ///     .with_user_input("Summarize the report")
    ///     .build();
    /// assert_eq!(state.messages.len(), 2);
    /// ```
    #[must_use]
    pub fn builder() -> AgentStateBuilder {
        AgentStateBuilder::default()
    }

    /// Clones the record into an immutable snapshot for a node invocation.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.clone()
    }

    /// True once the plan carries at least one pending tool step.
    #[must_use]
    pub fn has_planned_steps(&self) -> bool {
        self.plan.as_ref().is_some_and(|p| !p.steps.is_empty())
    }
}

/// Partial update returned by node execution.
///
/// One optional slot per state field; `None` slots leave the field alone.
/// The engine merges updates through [`crate::reducers::ReducerRegistry`],
/// so nodes only name what they changed.
///
/// # Examples
///
/// ```
/// use dialogos::message::Message;
/// use dialogos::state::StateUpdate;
///
/// let update = StateUpdate::new()
///     .with_messages(vec![Message::assistant("done")])
///     .with_decision("respond");
/// assert!(update.clean_input.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub input: Option<String>,
    pub clean_input: Option<String>,
    pub messages: Option<Vec<Message>>,
    pub plan: Option<Plan>,
    pub tool_results: Option<FxHashMap<String, Value>>,
    pub citations: Option<Vec<String>>,
    pub reasoning_chain: Option<Vec<String>>,
    pub learned_facts: Option<Vec<String>>,
    pub research_depth: Option<u32>,
    pub iteration_count: Option<u32>,
    pub sender: Option<String>,
    pub current_decision: Option<String>,
    pub final_response: Option<String>,
    pub error: Option<String>,
}

impl StateUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clean_input(mut self, clean_input: impl Into<String>) -> Self {
        self.clean_input = Some(clean_input.into());
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }

    #[must_use]
    pub fn with_tool_results(mut self, tool_results: FxHashMap<String, Value>) -> Self {
        self.tool_results = Some(tool_results);
        self
    }

    #[must_use]
    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = Some(citations);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, entry: impl Into<String>) -> Self {
        self.reasoning_chain
            .get_or_insert_with(Vec::new)
            .push(entry.into());
        self
    }

    #[must_use]
    pub fn with_facts(mut self, facts: Vec<String>) -> Self {
        self.learned_facts = Some(facts);
        self
    }

    #[must_use]
    pub fn with_research_depth(mut self, depth: u32) -> Self {
        self.research_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_iteration_count(mut self, count: u32) -> Self {
        self.iteration_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    #[must_use]
    pub fn with_decision(mut self, decision: impl Into<String>) -> Self {
        self.current_decision = Some(decision.into());
        self
    }

    #[must_use]
    pub fn with_final_response(mut self, text: impl Into<String>) -> Self {
        self.final_response = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// Fluent builder for [`AgentState`].
#[derive(Debug, Default)]
pub struct AgentStateBuilder {
    input: Option<String>,
    messages: Vec<Message>,
    learned_facts: Vec<String>,
}

impl AgentStateBuilder {
    /// Sets the raw input and appends the corresponding user message.
    #[must_use]
    pub fn with_user_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self.messages.push(Message::user(input));
        self
    }

    /// Appends a system message (prior instructions, persona, etc.).
    #[must_use]
    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Appends an assistant message from earlier history.
    #[must_use]
    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Seeds a known fact for the synthesis prompt.
    #[must_use]
    pub fn with_fact(mut self, fact: &str) -> Self {
        self.learned_facts.push(fact.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> AgentState {
        let input = self.input.unwrap_or_default();
        AgentState {
            clean_input: input.clone(),
            input,
            messages: self.messages,
            learned_facts: self.learned_facts,
            ..Default::default()
        }
    }
}
