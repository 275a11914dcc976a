//! What a run hands back to its caller.

use serde::Serialize;

use crate::state::RunState;

/// Why the loop stopped iterating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The decide stage chose the terminal tool.
    FinalAnswerSelected,
    /// `current_step` passed `max_steps`; the answer is produced from what was gathered.
    StepBudgetExhausted,
}

/// Chat-completion style envelope around the final answer.
///
/// Serializes as `{"choices":[{"message":{"role":"assistant","content":"..."}}]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentResponse {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChoiceMessage {
    pub role: String,
    pub content: String,
}

impl AgentResponse {
    /// Envelope with a single assistant choice.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: "assistant".to_string(),
                    content: content.into(),
                },
            }],
        }
    }

    /// Content of the first choice.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default()
    }
}

/// Response plus the final run state.
#[derive(Clone, Debug, Serialize)]
pub struct RunOutcome {
    pub response: AgentResponse,
    pub state: RunState,
    pub stop: StopReason,
}

impl RunOutcome {
    pub fn answer(&self) -> &str {
        self.response.content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_shape() {
        let r = AgentResponse::assistant("42");
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"choices": [{"message": {"role": "assistant", "content": "42"}}]})
        );
        assert_eq!(r.content(), "42");
    }

    #[test]
    fn stop_reason_snake_case() {
        assert_eq!(
            serde_json::to_value(StopReason::StepBudgetExhausted).unwrap(),
            "step_budget_exhausted"
        );
    }
}
