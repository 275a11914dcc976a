//! Run error types.
//!
//! [`AgentError`] is returned by [`Agent::process`](crate::Agent::process) and by every
//! stage function. Each variant is fatal for the run; tool failures that a tool reports
//! as its result string never become an `AgentError`.

use thiserror::Error;

use crate::tools::ToolError;

/// The model chose something the loop cannot act on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// The decide stage named a tool that is not registered.
    #[error("unknown tool `{name}` (available: {})", available.join(", "))]
    UnknownTool {
        name: String,
        available: Vec<String>,
    },

    /// The decide stage output had no string `tool` field (or was not structured at all).
    #[error("decision has no `tool` field: {raw}")]
    MissingTool { raw: String },
}

/// Fatal error for one agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The completion call itself failed (transport, auth, empty choice list).
    #[error("completion failed: {0}")]
    Completion(String),

    /// The decide stage produced an unusable tool choice.
    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),

    /// Strict mode only: the describe stage payload does not fit the tool's input schema.
    #[error("invalid payload for tool `{tool}`: {reason}")]
    InvalidPayload { tool: String, reason: String },

    /// The tool's invocation capability failed instead of returning a result string.
    #[error("tool `{tool}` invocation failed: {source}")]
    ToolInvocation {
        tool: String,
        #[source]
        source: ToolError,
    },

    /// Execute stage reached without a tool selected by decide.
    #[error("no active tool to execute")]
    NoActiveTool,

    /// Reflect stage reached with an empty action log.
    #[error("no action to reflect on")]
    NoActionToReflect,

    /// A stage prompt could not be built.
    #[error("prompt build failed: {0}")]
    Prompt(String),
}

impl AgentError {
    /// True for errors caused by the model's tool choice rather than by a collaborator failing.
    pub fn is_decision(&self) -> bool {
        matches!(self, AgentError::Decision(_))
    }
}

impl From<minijinja::Error> for AgentError {
    fn from(e: minijinja::Error) -> Self {
        AgentError::Prompt(e.to_string())
    }
}
