//! The agent loop.
//!
//! One run: `init → plan → decide → [describe → execute → reflect] → (loop) → final`.
//! Choosing the terminal tool in decide skips describe, execute and reflect; passing
//! `max_steps` ends the loop without error. Either way one final completion produces
//! the answer.
//!
//! Each full iteration makes four completion calls (plan, decide, describe, reflect) and
//! one tool call (execute). Every completion receives the stage system prompt followed by
//! the initiating message; stage outputs reach later stages only through the prompts.

mod response;
mod stages;

pub use response::{AgentResponse, Choice, ChoiceMessage, RunOutcome, StopReason};

use std::sync::Arc;

use tracing::{debug, info, warn, Instrument};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::observer::{RunEvent, RunObserver};
use crate::prompts::{self, AgentPrompts, PromptLoadError};
use crate::state::{RunState, Stage};
use crate::tools::ToolRegistry;

use stages::{Decision, StageContext, StageReport};

/// Plan / decide / describe / execute / reflect loop over a [`ToolRegistry`].
///
/// An `Agent` holds no per-run state; every call to [`process`](Self::process) or
/// [`run`](Self::run) starts from a fresh [`RunState`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stageloop::{Agent, MockLlm, ToolRegistry};
///
/// # #[tokio::main]
/// # async fn main() {
/// let llm = MockLlm::new(vec![
///     "- final_answer: nothing to look up".to_string(),
///     r#"{"_thoughts": "trivial", "tool": "final_answer"}"#.to_string(),
///     "Paris".to_string(),
/// ]);
/// let agent = Agent::new(Arc::new(llm), ToolRegistry::new());
/// let response = agent.process("Capital of France?").await.unwrap();
/// assert_eq!(response.content(), "Paris");
/// # }
/// ```
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    prompts: AgentPrompts,
    config: AgentConfig,
    observers: Vec<Arc<dyn RunObserver>>,
}

impl Agent {
    /// Agent with default prompts and [`AgentConfig::default`].
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools: Arc::new(tools),
            prompts: AgentPrompts::default(),
            config: AgentConfig::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_prompts(mut self, prompts: AgentPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Replaces the settings. Prompts are left as they are; use
    /// [`try_with_config`](Self::try_with_config) to also load `config.prompts_dir`.
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the settings and, when `config.prompts_dir` is set, loads the stage
    /// prompts from that directory.
    pub fn try_with_config(self, config: AgentConfig) -> Result<Self, PromptLoadError> {
        let agent = match &config.prompts_dir {
            Some(dir) => self.with_prompts(prompts::load(Some(dir.as_path()))?),
            None => self,
        };
        Ok(agent.with_config(config))
    }

    /// Sets the iteration ceiling. Values below 1 are raised to 1.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.config.max_steps = max_steps.max(1);
        self
    }

    pub fn with_strict_payloads(mut self, strict: bool) -> Self {
        self.config.strict_payloads = strict;
        self
    }

    /// Attaches an observer; observers are notified in attach order.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one task and returns the final answer envelope.
    pub async fn process(&self, message: impl Into<Message>) -> Result<AgentResponse, AgentError> {
        Ok(self.run(message).await?.response)
    }

    /// Runs one task and returns the answer with the final state and stop reason.
    pub async fn run(&self, message: impl Into<Message>) -> Result<RunOutcome, AgentError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "stageloop_run",
            run_id = %run_id,
            max_steps = self.config.max_steps,
        );
        let message = message.into();
        async move {
            let result = self.run_inner(&run_id, message).await;
            if let Err(e) = &result {
                warn!(error = %e, "run aborted");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self, run_id: &str, message: Message) -> Result<RunOutcome, AgentError> {
        let ctx = StageContext {
            llm: self.llm.as_ref(),
            tools: &self.tools,
            prompts: &self.prompts,
            strict_payloads: self.config.strict_payloads,
        };
        let mut state = RunState::new(message, self.config.max_steps.max(1));
        self.emit(&RunEvent::RunStarted {
            run_id: run_id.to_string(),
            task: state.task().unwrap_or_default().to_string(),
            max_steps: state.max_steps,
        });

        let stop = loop {
            if state.budget_exhausted() {
                info!(steps = state.max_steps, "step budget exhausted");
                break StopReason::StepBudgetExhausted;
            }

            self.started(Stage::Plan, &state);
            let report = stages::plan(&ctx, &mut state).await?;
            self.finished(Stage::Plan, &state, report);

            self.started(Stage::Decide, &state);
            let (decision, report) = stages::decide(&ctx, &mut state).await?;
            self.finished(Stage::Decide, &state, report);
            if decision == Decision::Finish {
                break StopReason::FinalAnswerSelected;
            }

            self.started(Stage::Describe, &state);
            let report = stages::describe(&ctx, &mut state).await?;
            self.finished(Stage::Describe, &state, report);

            self.started(Stage::Execute, &state);
            let report = stages::execute(&ctx, &mut state).await?;
            self.finished(Stage::Execute, &state, report);

            self.started(Stage::Reflect, &state);
            let report = stages::reflect(&ctx, &mut state).await?;
            self.finished(Stage::Reflect, &state, report);
            if let Some(action) = state.last_action() {
                self.emit(&RunEvent::ActionRecorded {
                    step: state.current_step,
                    action: action.clone(),
                });
            }

            state.current_step += 1;
        };

        self.started(Stage::Final, &state);
        let (answer, report) = stages::finalize(&ctx, &mut state).await?;
        self.finished(Stage::Final, &state, report);

        let steps_used = state.actions_taken.len() as u32;
        info!(?stop, steps_used, "run finished");
        self.emit(&RunEvent::RunFinished {
            run_id: run_id.to_string(),
            stop,
            steps_used,
            answer: answer.clone(),
        });

        Ok(RunOutcome {
            response: AgentResponse::assistant(answer),
            state,
            stop,
        })
    }

    fn started(&self, stage: Stage, state: &RunState) {
        debug!(%stage, step = state.current_step, "stage started");
        self.emit(&RunEvent::StageStarted {
            stage,
            step: state.current_step,
        });
    }

    fn finished(&self, stage: Stage, state: &RunState, report: StageReport) {
        debug!(%stage, step = state.current_step, "stage finished");
        self.emit(&RunEvent::StageFinished {
            stage,
            step: state.current_step,
            heading: report.heading.to_string(),
            content: report.content,
        });
    }

    fn emit(&self, event: &RunEvent) {
        for observer in &self.observers {
            if let Err(e) = observer.on_event(event) {
                warn!(error = %e, "run observer failed");
            }
        }
    }
}
