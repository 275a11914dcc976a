use serde::Serialize;
use serde_json::Value;

use crate::message::Message;

/// Stage whose prompt is currently active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Init,
    Plan,
    Decide,
    Describe,
    Execute,
    Reflect,
    Final,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Plan => "plan",
            Stage::Decide => "decide",
            Stage::Describe => "describe",
            Stage::Execute => "execute",
            Stage::Reflect => "reflect",
            Stage::Final => "final",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool selected by the decide stage for the current iteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActiveTool {
    pub name: String,
    pub description: String,
    pub instruction: String,
}

/// Outcome of one execute stage.
///
/// `reflection` starts empty and is written once by the reflect stage of the same
/// iteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub name: String,
    /// The describe stage payload, JSON-serialized.
    pub payload: String,
    pub result: String,
    pub reflection: String,
    pub tool: String,
}

/// Mutable record of one run.
///
/// Invariants kept by the loop:
/// - `1 <= current_step <= max_steps + 1`;
/// - `messages` holds only the initiating message; stage outputs are carried in the
///   stage prompts, never appended here;
/// - `actions_taken` only grows, and only its last entry is ever modified.
#[derive(Clone, Debug, Serialize)]
pub struct RunState {
    pub current_stage: Stage,
    pub current_step: u32,
    pub max_steps: u32,
    pub messages: Vec<Message>,
    pub system_prompt: String,
    pub plan: String,
    pub active_tool: Option<ActiveTool>,
    pub active_tool_payload: Option<Value>,
    pub actions_taken: Vec<ActionRecord>,
}

impl RunState {
    /// Fresh state for one run, seeded with the initiating message.
    pub fn new(message: Message, max_steps: u32) -> Self {
        Self {
            current_stage: Stage::Init,
            current_step: 1,
            max_steps,
            messages: vec![message],
            system_prompt: String::new(),
            plan: String::new(),
            active_tool: None,
            active_tool_payload: None,
            actions_taken: Vec::new(),
        }
    }

    /// Content of the first user message (the task), if any.
    pub fn task(&self) -> Option<&str> {
        self.messages.iter().find_map(|m| match m {
            Message::User(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// True once `current_step` has passed `max_steps`.
    pub fn budget_exhausted(&self) -> bool {
        self.current_step > self.max_steps
    }

    pub fn last_action(&self) -> Option<&ActionRecord> {
        self.actions_taken.last()
    }

    /// Name of the active tool, if decide has run.
    pub fn active_tool_name(&self) -> Option<&str> {
        self.active_tool.as_ref().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_at_init_step_one() {
        let state = RunState::new(Message::user("task"), 3);
        assert_eq!(state.current_stage, Stage::Init);
        assert_eq!(state.current_step, 1);
        assert_eq!(state.max_steps, 3);
        assert_eq!(state.messages, vec![Message::user("task")]);
        assert!(state.active_tool.is_none());
        assert!(state.active_tool_payload.is_none());
        assert!(state.actions_taken.is_empty());
        assert_eq!(state.task(), Some("task"));
    }

    #[test]
    fn budget_exhausted_after_max_steps() {
        let mut state = RunState::new(Message::user("t"), 2);
        assert!(!state.budget_exhausted());
        state.current_step = 2;
        assert!(!state.budget_exhausted());
        state.current_step = 3;
        assert!(state.budget_exhausted());
    }

    #[test]
    fn stage_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Stage::Describe).unwrap(), "describe");
        assert_eq!(Stage::Final.to_string(), "final");
    }
}
