use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::provider::ChatProvider;
use crate::state::{Plan, PlanStep, StateSnapshot, StateUpdate};
use crate::tools::ToolRegistry;
use crate::utils::json_repair::parse_loose;

use super::PLAN;

const PLANNING_PROMPT: &str = "You are the planning stage of an assistant. \
Decide which of the available tools, if any, are needed to answer the user. \
Reply with JSON only: {\"intent\": string, \"steps\": [{\"tool\": string, \
\"params\": object}], \"reasoning\": string}. Use an empty steps array when \
no tool is needed.";

/// Planning stage: one model call that turns the cleaned input into a
/// structured [`Plan`].
///
/// The reply is parsed defensively: structured tool calls first, then
/// repaired JSON, then a plain-text fallback with no steps. Forced steps
/// seeded by the analyze stage always survive, prepended ahead of whatever
/// the model chose. Steps naming unregistered tools are dropped with a
/// warning.
pub struct PlanNode {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<ToolRegistry>,
}

impl PlanNode {
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self { provider, tools }
    }

    fn parse_plan(&self, content: &str) -> Plan {
        let Some(value) = parse_loose(content) else {
            // Unstructured reply: keep it as reasoning, plan nothing.
            return Plan {
                intent: String::new(),
                steps: Vec::new(),
                reasoning: content.trim().to_string(),
            };
        };
        match serde_json::from_value::<Plan>(value) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(error = %err, "plan JSON had unexpected shape; treating as no-op plan");
                Plan {
                    intent: String::new(),
                    steps: Vec::new(),
                    reasoning: content.trim().to_string(),
                }
            }
        }
    }
}

fn default_params(params: Value, clean_input: &str) -> Value {
    if params.is_object() {
        params
    } else {
        json!({"query": clean_input})
    }
}

#[async_trait]
impl Node for PlanNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let query = if snapshot.clean_input.is_empty() {
            snapshot.input.clone()
        } else {
            snapshot.clean_input.clone()
        };

        let specs = self.tools.specs();
        let catalog: Vec<String> = specs
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect();
        let system = format!("{PLANNING_PROMPT}\n\nAvailable tools:\n{}", catalog.join("\n"));
        let messages = [Message::system(&system), Message::user(&query)];

        let completion = self.provider.invoke_with_tools(&messages, &specs).await?;

        let mut plan = if completion.tool_calls.is_empty() {
            self.parse_plan(&completion.content)
        } else {
            Plan {
                intent: completion.content.trim().to_string(),
                steps: completion
                    .tool_calls
                    .iter()
                    .map(|call| PlanStep {
                        tool: call.name.clone(),
                        params: call.args.clone(),
                        forced: false,
                    })
                    .collect(),
                reasoning: "model requested tool calls".to_string(),
            }
        };

        // Forced steps from the analyze stage survive replanning.
        if let Some(previous) = &snapshot.plan {
            let forced: Vec<PlanStep> = previous
                .steps
                .iter()
                .filter(|s| s.forced && !plan.steps.iter().any(|p| p.tool == s.tool))
                .cloned()
                .collect();
            let mut steps = forced;
            steps.append(&mut plan.steps);
            plan.steps = steps;
        }

        plan.steps.retain(|step| {
            let known = self.tools.contains(&step.tool);
            if !known {
                tracing::warn!(tool = %step.tool, "planned tool is not registered; dropping step");
            }
            known
        });
        for step in &mut plan.steps {
            step.params = default_params(step.params.clone(), &query);
        }

        let decision = if plan.steps.is_empty() {
            "respond"
        } else {
            "tools"
        };
        let reasoning = if plan.reasoning.is_empty() {
            format!("planned {} tool step(s)", plan.steps.len())
        } else {
            plan.reasoning.clone()
        };

        Ok(StateUpdate::new()
            .with_plan(plan)
            .with_sender(PLAN)
            .with_decision(decision)
            .with_iteration_count(snapshot.iteration_count + 1)
            .with_reasoning(reasoning))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_fills_query() {
        let filled = default_params(Value::Null, "find this");
        assert_eq!(filled, json!({"query": "find this"}));
        let kept = default_params(json!({"city": "Paris"}), "ignored");
        assert_eq!(kept, json!({"city": "Paris"}));
    }
}
