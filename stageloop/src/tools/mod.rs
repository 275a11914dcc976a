//! Tool registry contract: named tools with a description, a payload instruction and an
//! async invocation capability.

mod fn_tool;
mod registry;
mod r#trait;
pub mod web;

pub use fn_tool::FnTool;
pub use r#trait::Tool;
pub use registry::{ToolLookupError, ToolRegistry, ToolSpec};
pub use web::{WebFetcherTool, TOOL_WEB_FETCHER};

/// Reserved tool name that ends the loop. Never executed.
pub const TOOL_FINAL_ANSWER: &str = "final_answer";

/// Catalogue description of [`TOOL_FINAL_ANSWER`] when no tool of that name is registered.
pub const FINAL_ANSWER_DESCRIPTION: &str =
    "Use this when all required steps are done or nothing else can be done; ends the loop and answers the user.";

/// Failure of a tool's invocation capability.
///
/// Fatal for the run (see [`AgentError::ToolInvocation`](crate::AgentError::ToolInvocation)).
/// Tools report expected failures as their result string instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}
