use async_trait::async_trait;
use serde_json::Value;

use super::ToolError;

/// A capability the agent can invoke, identified by name.
///
/// `description` tells the plan and decide stages what the tool is for;
/// `instruction` tells the describe stage what payload to produce. The loop passes the
/// payload through unchanged, so a tool should check it and report problems in its
/// result string.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use stageloop::tools::{Tool, ToolError};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn description(&self) -> &str {
///         "Repeat the payload back"
///     }
///
///     fn instruction(&self) -> &str {
///         r#"Required payload: {"text": "what to repeat"}"#
///     }
///
///     async fn call(&self, payload: Value) -> Result<String, ToolError> {
///         Ok(payload["text"].as_str().unwrap_or_default().to_string())
///     }
/// }
/// ```
///
/// # Errors
///
/// Expected failures (bad URL, timeout, rejected form) should be returned as
/// `Ok("Failed: ...")` so the run continues to the reflect stage. An `Err` is fatal
/// for the run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a [`ToolRegistry`](super::ToolRegistry).
    fn name(&self) -> &str;

    /// What the tool is for.
    fn description(&self) -> &str;

    /// Expected payload shape.
    fn instruction(&self) -> &str;

    /// Optional JSON Schema for the payload; only consulted in strict mode.
    fn input_schema(&self) -> Option<Value> {
        None
    }

    /// Runs the tool with the payload produced by the describe stage.
    async fn call(&self, payload: Value) -> Result<String, ToolError>;
}
