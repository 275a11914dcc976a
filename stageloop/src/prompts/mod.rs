//! Stage prompt builders.
//!
//! Each stage gets its system prompt from a [`StagePrompt`]: a constant string, a sync
//! function of `(state, tools)`, or any async [`PromptBuilder`]. Builders receive
//! `&RunState`, so they cannot change the run.
//!
//! Defaults are minijinja templates embedded from `prompts/stages.yaml`; see [`load`] to
//! override them from a directory.

mod load;
mod template;

pub use load::{default_from_embedded, load, load_or_default, PromptLoadError, PROMPTS_DIR_ENV};
pub use template::TemplatePrompt;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::{ActionRecord, RunState};
use crate::tools::ToolRegistry;

/// Marker used for an empty action log.
pub const NO_ACTIONS_MARKER: &str = "<message>No actions taken yet</message>";

/// Prompt slots: one per completion-making stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptStage {
    Plan,
    Decide,
    Describe,
    Reflect,
    FinalAnswer,
}

impl PromptStage {
    pub const ALL: [PromptStage; 5] = [
        PromptStage::Plan,
        PromptStage::Decide,
        PromptStage::Describe,
        PromptStage::Reflect,
        PromptStage::FinalAnswer,
    ];

    /// Key used in `stages.yaml`.
    pub fn key(&self) -> &'static str {
        match self {
            PromptStage::Plan => "plan",
            PromptStage::Decide => "decide",
            PromptStage::Describe => "describe",
            PromptStage::Reflect => "reflect",
            PromptStage::FinalAnswer => "final_answer",
        }
    }
}

/// Builds a stage system prompt from the current run.
#[async_trait]
pub trait PromptBuilder: Send + Sync {
    async fn build(&self, state: &RunState, tools: &ToolRegistry) -> Result<String, AgentError>;
}

/// [`PromptBuilder`] backed by a synchronous closure.
pub struct FnPrompt<F>(F);

#[async_trait]
impl<F> PromptBuilder for FnPrompt<F>
where
    F: Fn(&RunState, &ToolRegistry) -> String + Send + Sync,
{
    async fn build(&self, state: &RunState, tools: &ToolRegistry) -> Result<String, AgentError> {
        Ok((self.0)(state, tools))
    }
}

/// System prompt source for one stage.
#[derive(Clone)]
pub enum StagePrompt {
    Static(String),
    Builder(Arc<dyn PromptBuilder>),
}

impl StagePrompt {
    /// Prompt computed by a sync function of `(state, tools)`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&RunState, &ToolRegistry) -> String + Send + Sync + 'static,
    {
        StagePrompt::Builder(Arc::new(FnPrompt(f)))
    }

    pub fn builder<B: PromptBuilder + 'static>(builder: B) -> Self {
        StagePrompt::Builder(Arc::new(builder))
    }

    /// Produces the prompt text for the current state.
    pub async fn resolve(
        &self,
        state: &RunState,
        tools: &ToolRegistry,
    ) -> Result<String, AgentError> {
        match self {
            StagePrompt::Static(s) => Ok(s.clone()),
            StagePrompt::Builder(b) => b.build(state, tools).await,
        }
    }
}

impl std::fmt::Debug for StagePrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagePrompt::Static(s) => f.debug_tuple("Static").field(s).finish(),
            StagePrompt::Builder(_) => f.write_str("Builder(..)"),
        }
    }
}

impl From<&str> for StagePrompt {
    fn from(s: &str) -> Self {
        StagePrompt::Static(s.to_string())
    }
}

impl From<String> for StagePrompt {
    fn from(s: String) -> Self {
        StagePrompt::Static(s)
    }
}

impl From<TemplatePrompt> for StagePrompt {
    fn from(t: TemplatePrompt) -> Self {
        StagePrompt::builder(t)
    }
}

/// Prompts for every stage of one agent.
#[derive(Clone, Debug)]
pub struct AgentPrompts {
    pub plan: StagePrompt,
    pub decide: StagePrompt,
    pub describe: StagePrompt,
    pub reflect: StagePrompt,
    pub final_answer: StagePrompt,
}

impl AgentPrompts {
    pub fn get(&self, stage: PromptStage) -> &StagePrompt {
        match stage {
            PromptStage::Plan => &self.plan,
            PromptStage::Decide => &self.decide,
            PromptStage::Describe => &self.describe,
            PromptStage::Reflect => &self.reflect,
            PromptStage::FinalAnswer => &self.final_answer,
        }
    }

    /// Replaces one stage prompt (builder).
    pub fn with(mut self, stage: PromptStage, prompt: impl Into<StagePrompt>) -> Self {
        let slot = match stage {
            PromptStage::Plan => &mut self.plan,
            PromptStage::Decide => &mut self.decide,
            PromptStage::Describe => &mut self.describe,
            PromptStage::Reflect => &mut self.reflect,
            PromptStage::FinalAnswer => &mut self.final_answer,
        };
        *slot = prompt.into();
        self
    }
}

impl Default for AgentPrompts {
    fn default() -> Self {
        default_from_embedded()
    }
}

/// One action as an `<action>` block.
pub fn render_action(action: &ActionRecord) -> String {
    format!(
        "<action>\n<name>{}</name>\n<payload>{}</payload>\n<result>{}</result>\n<reflection>{}</reflection>\n</action>",
        action.name, action.payload, action.result, action.reflection
    )
}

/// The whole action log, blocks separated by a blank line; [`NO_ACTIONS_MARKER`] when empty.
pub fn render_actions_taken(actions: &[ActionRecord]) -> String {
    if actions.is_empty() {
        return NO_ACTIONS_MARKER.to_string();
    }
    actions
        .iter()
        .map(render_action)
        .collect::<Vec<_>>()
        .join("\n\n")
}
