//! Mock LLM for tests and examples.
//!
//! Replies come from a script (one reply per call, in order) or from a responder
//! closure that sees the full request. Every request is recorded so tests can assert
//! how many completion calls a run made and what each one received.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;

type Responder = Box<dyn Fn(&[Message]) -> Result<String, AgentError> + Send + Sync>;

/// Scripted [`LlmClient`].
///
/// - [`MockLlm::new`]: replies in order; once the script is used up, calls fail with
///   [`AgentError::Completion`] (or return the [`with_fallback`](MockLlm::with_fallback) reply).
/// - [`MockLlm::with_responder`]: computes each reply from the request, e.g. by matching
///   on the stage system prompt.
pub struct MockLlm {
    script: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    responder: Option<Responder>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Creates a mock that returns `replies` one per call.
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            fallback: None,
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that always returns `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(Vec::new()).with_fallback(reply)
    }

    /// Creates a mock whose replies are computed from each request.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[Message]) -> Result<String, AgentError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            responder: Some(Box::new(responder)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply used once the script is exhausted (builder).
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Every request received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// System prompt of every request, in call order.
    pub fn system_prompts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|messages| match messages.first() {
                Some(Message::System(s)) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    fn next_scripted(&self) -> Option<String> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        if let Some(responder) = &self.responder {
            return responder(messages).map(LlmResponse::text);
        }
        self.next_scripted()
            .or_else(|| self.fallback.clone())
            .map(LlmResponse::text)
            .ok_or_else(|| AgentError::Completion("mock script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_is_consumed_in_order_then_fails() {
        let llm = MockLlm::new(vec!["one".into(), "two".into()]);
        let msgs = vec![Message::user("hi")];
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "one");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "two");
        let err = llm.invoke(&msgs).await.unwrap_err();
        assert!(matches!(err, AgentError::Completion(_)));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn fallback_used_after_script() {
        let llm = MockLlm::new(vec!["first".into()]).with_fallback("again");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "first");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "again");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "again");
    }

    #[tokio::test]
    async fn responder_sees_request() {
        let llm = MockLlm::with_responder(|messages| Ok(format!("{} messages", messages.len())));
        let out = llm
            .invoke(&[Message::system("s"), Message::user("u")])
            .await
            .unwrap();
        assert_eq!(out.content, "2 messages");
        assert_eq!(llm.system_prompts(), vec!["s".to_string()]);
    }
}
