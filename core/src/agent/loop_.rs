use crate::agent::history::{ConversationHistory, HistoryEntry};
use crate::agent::parser::{Action, ParsedStep};
use crate::agent::prompt::{PromptBuilder, render_turn};
use crate::agent::registry::ToolRegistry;
use crate::db::Database;
use crate::error::SetupError;
use crate::format::{Observation, format_observation};
use crate::traits::{ChatMessage, ChatRequest, EventSink, NullSink, Provider, StepEvent, ToolSpec};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_STEPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    FinalAnswer,
    BudgetExhausted,
}

/// Outcome of one run. `answer` is set exactly when the reason is
/// [`TerminationReason::FinalAnswer`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub answer: Option<String>,
    pub reason: TerminationReason,
    pub steps: usize,
    pub history: ConversationHistory,
}

impl RunReport {
    pub fn ran_out_of_steps(&self) -> bool {
        self.reason == TerminationReason::BudgetExhausted
    }
}

struct RunState {
    step_index: usize,
    budget: usize,
    history: ConversationHistory,
    terminated: Option<(TerminationReason, Option<String>)>,
}

impl RunState {
    fn new(query: &str, budget: usize) -> Self {
        Self {
            step_index: 0,
            budget,
            history: ConversationHistory::new(query),
            terminated: None,
        }
    }

    fn has_budget(&self) -> bool {
        self.terminated.is_none() && self.step_index < self.budget
    }

    fn into_report(self) -> RunReport {
        let (reason, answer) = self
            .terminated
            .unwrap_or((TerminationReason::BudgetExhausted, None));
        RunReport {
            answer,
            reason,
            steps: self.step_index,
            history: self.history,
        }
    }
}

/// Drives the thought/action/observation loop for one database.
///
/// Each step sends the whole history to the model, dispatches at most one
/// action and appends what happened. Dispatch problems are folded into the
/// conversation; only a failing model call ends a run early with an error.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tool_registry: ToolRegistry,
    database: Database,
    tool_specs: Vec<ToolSpec>,
    system_prompt: String,
    max_steps: usize,
    temperature: f64,
    sink: Arc<dyn EventSink>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tool_registry: ToolRegistry,
        database: Database,
    ) -> Result<Self, SetupError> {
        let schema = database
            .schema_summary()
            .map_err(|e| SetupError::Schema(format!("{:#}", e)))?;
        let tool_specs = tool_registry.get_specs();
        let system_prompt = PromptBuilder::new(schema)
            .with_tool_specs(tool_specs.clone())
            .build_system_prompt();

        Ok(Self {
            provider,
            tool_registry,
            database,
            tool_specs,
            system_prompt,
            max_steps: DEFAULT_MAX_STEPS,
            temperature: 0.0,
            sink: Arc::new(NullSink),
        })
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub async fn process(&self, query: &str) -> Result<RunReport> {
        let mut state = RunState::new(query, self.max_steps);

        while state.has_budget() {
            state.step_index += 1;
            let step = state.step_index;

            let messages = [ChatMessage::user(render_turn(&state.history))];
            let request = ChatRequest {
                system: &self.system_prompt,
                messages: &messages,
                tools: if self.tool_specs.is_empty() {
                    None
                } else {
                    Some(self.tool_specs.as_slice())
                },
                temperature: self.temperature,
            };

            let response = self
                .provider
                .chat(request)
                .await
                .with_context(|| format!("model call failed at step {}", step))?;

            let structured = response.has_tool_calls();
            let mut parsed = ParsedStep::from_response(&response);
            if let (true, Some(action)) = (structured, &parsed.action) {
                parsed.thought = Some(format!(
                    "I will call the tool '{}' with arguments {} to retrieve the required data.",
                    action.name,
                    serde_json::Value::Object(action.arguments.clone())
                ));
            }
            debug!(step, structured, ?parsed, "model step parsed");

            if parsed.action.is_none() && parsed.final_answer.is_none() {
                debug!(step, "no action or final answer in reply");
            }

            if let Some(thought) = parsed.thought {
                self.emit(StepEvent::Thought {
                    step,
                    text: thought.clone(),
                });
                state.history.push(HistoryEntry::Thought(thought));
            }

            if let Some(action) = parsed.action {
                self.emit(StepEvent::Action {
                    step,
                    name: action.name.clone(),
                    arguments: action.arguments.clone(),
                });
                let observation = self.observe(&action);
                state.history.push(HistoryEntry::Action(action));
                self.emit(StepEvent::Observation {
                    step,
                    text: observation.clone(),
                });
                state.history.push(HistoryEntry::Observation(observation));

                if structured {
                    continue;
                }
            }

            if let Some(answer) = parsed.final_answer {
                self.emit(StepEvent::Final {
                    step,
                    answer: answer.clone(),
                });
                state.terminated = Some((TerminationReason::FinalAnswer, Some(answer)));
            }
        }

        let report = state.into_report();
        info!(steps = report.steps, reason = ?report.reason, "run finished");
        Ok(report)
    }

    fn observe(&self, action: &Action) -> String {
        let observation = self
            .tool_registry
            .dispatch(&action.name, &action.arguments, &self.database)
            .unwrap_or_else(|e| {
                warn!(tool = %action.name, "dispatch failed: {}", e);
                Observation::error(format!("Tool error: {}", e))
            });
        format_observation(&observation)
    }

    fn emit(&self, event: StepEvent) {
        self.sink.emit(&event);
    }
}
