//! Completion capability consumed by the agent loop.
//!
//! Every stage makes at most one call through [`complete`]: the stage's system prompt
//! followed by the run's message history. The stage also declares which
//! [`ResponseFormat`] it expects; for [`ResponseFormat::Json`] the reply is parsed into
//! [`Completion::Structured`] when possible and silently kept as
//! [`Completion::Text`] otherwise. Whether missing structure is a problem is decided by
//! the stage, never here.
//!
//! Implementations: [`MockLlm`] (scripted, for tests) and [`ChatOpenAI`] (OpenAI-compatible API).

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::error::AgentError;
use crate::message::Message;

/// Token usage for one completion call.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw reply of one completion call.
#[derive(Clone, Debug)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// LLM client: given messages, returns the assistant text.
///
/// Errors are reported as [`AgentError::Completion`]; the loop treats them as fatal.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}

/// What a stage expects back from the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Keep the reply as text.
    Text,
    /// Try to parse the reply as JSON; fall back to text.
    Json,
}

/// Outcome of one completion call.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    /// JSON was requested and the reply parsed.
    Structured(Value),
    /// Text was requested, or JSON was requested and the reply did not parse.
    Text(String),
}

impl Completion {
    /// Builds the outcome for `content` under `format`.
    pub fn from_content(content: String, format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Text => Completion::Text(content),
            ResponseFormat::Json => match parse_json_reply(&content) {
                Some(v) => Completion::Structured(v),
                None => Completion::Text(content),
            },
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Completion::Structured(v) => Some(v),
            Completion::Text(_) => None,
        }
    }

    /// Text view of the outcome: raw text as-is, JSON strings unquoted, other JSON serialized.
    pub fn to_text(&self) -> String {
        match self {
            Completion::Text(s) => s.clone(),
            Completion::Structured(Value::String(s)) => s.clone(),
            Completion::Structured(v) => v.to_string(),
        }
    }

    /// Consumes the outcome as a JSON value; raw text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Completion::Structured(v) => v,
            Completion::Text(s) => Value::String(s),
        }
    }
}

/// Parses a model reply as JSON. Accepts surrounding whitespace and a Markdown code fence.
fn parse_json_reply(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Some(v);
    }
    let inner = trimmed.strip_prefix("```")?.strip_suffix("```")?;
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    serde_json::from_str(inner.trim()).ok()
}

/// Makes one completion call: `system_prompt` first, then `history`.
pub async fn complete(
    llm: &dyn LlmClient,
    system_prompt: &str,
    history: &[Message],
    format: ResponseFormat,
) -> Result<Completion, AgentError> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(history);
    trace!(system_prompt = %system_prompt, history = history.len(), "completion request");
    let response = llm.invoke(&messages).await?;
    Ok(Completion::from_content(response.content, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_format_parses_object() {
        let c = Completion::from_content(r#"{"tool": "search"}"#.to_string(), ResponseFormat::Json);
        assert_eq!(c, Completion::Structured(json!({"tool": "search"})));
    }

    #[test]
    fn json_format_falls_back_to_raw_text() {
        let raw = "I think we should search".to_string();
        let c = Completion::from_content(raw.clone(), ResponseFormat::Json);
        assert_eq!(c, Completion::Text(raw));
    }

    #[test]
    fn json_format_accepts_code_fence() {
        let c = Completion::from_content(
            "```json\n{\"url\": \"https://example.com\"}\n```".to_string(),
            ResponseFormat::Json,
        );
        assert_eq!(c, Completion::Structured(json!({"url": "https://example.com"})));
    }

    #[test]
    fn text_format_never_parses() {
        let c = Completion::from_content(r#"{"a": 1}"#.to_string(), ResponseFormat::Text);
        assert_eq!(c, Completion::Text(r#"{"a": 1}"#.to_string()));
    }

    #[test]
    fn to_text_unquotes_json_strings() {
        assert_eq!(Completion::Structured(json!("done")).to_text(), "done");
        assert_eq!(Completion::Structured(json!({"a": 1})).to_text(), r#"{"a":1}"#);
        assert_eq!(Completion::Text("plain".into()).into_value(), json!("plain"));
    }

    #[tokio::test]
    async fn complete_puts_system_prompt_first() {
        let llm = MockLlm::new(vec!["ok".to_string()]);
        let history = vec![Message::user("task")];
        let out = complete(&llm, "be brief", &history, ResponseFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, Completion::Text("ok".to_string()));
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![Message::system("be brief"), Message::user("task")]);
    }
}
