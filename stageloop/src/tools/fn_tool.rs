use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::r#trait::Tool;
use super::ToolError;

type ToolFn = Box<dyn Fn(Value) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync>;

/// Tool backed by an async closure.
///
/// Lets a task script declare a tool inline: name, description, payload instruction and
/// the function to run.
///
/// ```
/// use stageloop::tools::{FnTool, Tool};
///
/// # #[tokio::main]
/// # async fn main() {
/// let tool = FnTool::new(
///     "shout",
///     "Upper-case a text",
///     r#"Required payload: {"text": "..."}"#,
///     |payload| async move {
///         Ok(payload["text"].as_str().unwrap_or_default().to_uppercase())
///     },
/// );
/// let out = tool.call(serde_json::json!({"text": "hi"})).await.unwrap();
/// assert_eq!(out, "HI");
/// # }
/// ```
pub struct FnTool {
    name: String,
    description: String,
    instruction: String,
    input_schema: Option<Value>,
    function: ToolFn,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
        function: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            instruction: instruction.into(),
            input_schema: None,
            function: Box::new(move |payload| function(payload).boxed()),
        }
    }

    /// Attach a JSON Schema checked in strict mode (builder).
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn instruction(&self) -> &str {
        &self.instruction
    }

    fn input_schema(&self) -> Option<Value> {
        self.input_schema.clone()
    }

    async fn call(&self, payload: Value) -> Result<String, ToolError> {
        (self.function)(payload).await
    }
}
