//! minijinja-backed stage prompt.

use async_trait::async_trait;
use minijinja::Environment;
use serde::Serialize;

use crate::error::AgentError;
use crate::state::{ActionRecord, ActiveTool, RunState};
use crate::tools::{ToolRegistry, ToolSpec};

use super::{render_action, render_actions_taken, PromptBuilder};

/// Values a stage template can reference.
#[derive(Serialize)]
struct PromptContext<'a> {
    tools: Vec<ToolSpec>,
    catalogue: String,
    plan: &'a str,
    actions: &'a [ActionRecord],
    actions_text: String,
    last_action: Option<&'a ActionRecord>,
    last_action_text: String,
    active_tool: Option<&'a ActiveTool>,
    step: u32,
    max_steps: u32,
    task: &'a str,
}

impl<'a> PromptContext<'a> {
    fn new(state: &'a RunState, tools: &ToolRegistry) -> Self {
        let last_action = state.last_action();
        Self {
            tools: tools.specs(),
            catalogue: tools.render_catalogue(),
            plan: &state.plan,
            actions: &state.actions_taken,
            actions_text: render_actions_taken(&state.actions_taken),
            last_action,
            last_action_text: last_action
                .map(render_action)
                .unwrap_or_else(|| super::NO_ACTIONS_MARKER.to_string()),
            active_tool: state.active_tool.as_ref(),
            step: state.current_step,
            max_steps: state.max_steps,
            task: state.task().unwrap_or_default(),
        }
    }
}

/// Stage prompt rendered from a minijinja template.
#[derive(Clone, Debug)]
pub struct TemplatePrompt {
    source: String,
}

impl TemplatePrompt {
    /// Wraps `source` without checking it; syntax errors surface on first render.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Wraps `source` after checking that it compiles.
    pub fn parse(source: impl Into<String>) -> Result<Self, minijinja::Error> {
        let source = source.into();
        {
            let env = Environment::new();
            env.template_from_str(&source)?;
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the template against the run state and registry.
    pub fn render(&self, state: &RunState, tools: &ToolRegistry) -> Result<String, AgentError> {
        let env = Environment::new();
        let template = env.template_from_str(&self.source)?;
        let rendered = template.render(PromptContext::new(state, tools))?;
        Ok(rendered)
    }
}

#[async_trait]
impl PromptBuilder for TemplatePrompt {
    async fn build(&self, state: &RunState, tools: &ToolRegistry) -> Result<String, AgentError> {
        self.render(state, tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn renders_plan_and_catalogue() {
        let mut state = RunState::new(Message::user("find it"), 4);
        state.plan = "- web_fetcher: get page".to_string();
        let t = TemplatePrompt::parse("{{ task }}|{{ plan }}|{{ catalogue }}|{{ step }}/{{ max_steps }}")
            .unwrap();
        let out = t.render(&state, &ToolRegistry::new()).unwrap();
        assert!(out.starts_with("find it|- web_fetcher: get page|- final_answer: "), "{}", out);
        assert!(out.ends_with("|1/4"), "{}", out);
    }

    #[test]
    fn active_tool_fields_are_available() {
        let mut state = RunState::new(Message::user("t"), 1);
        state.active_tool = Some(ActiveTool {
            name: "save".into(),
            description: "d".into(),
            instruction: "{\"id\": \"...\"}".into(),
        });
        let t = TemplatePrompt::new("{% if active_tool %}{{ active_tool.name }}: {{ active_tool.instruction }}{% endif %}");
        let out = t.render(&state, &ToolRegistry::new()).unwrap();
        assert_eq!(out, "save: {\"id\": \"...\"}");
    }

    #[test]
    fn parse_rejects_broken_template() {
        assert!(TemplatePrompt::parse("{% if %}").is_err());
    }

    #[test]
    fn render_error_is_prompt_error() {
        let t = TemplatePrompt::new("{{ unclosed");
        let err = t
            .render(&RunState::new(Message::user("t"), 1), &ToolRegistry::new())
            .unwrap_err();
        assert!(matches!(err, AgentError::Prompt(_)));
    }
}
