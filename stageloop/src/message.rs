//! Conversation turns sent to the completion capability.
//!
//! A run seeds [`RunState::messages`](crate::RunState::messages) once with the user's
//! task; every stage sends its own system prompt in front of that history.

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    /// Stage system prompt; always first in a completion request.
    System(String),
    /// User input (the initiating task).
    User(String),
    /// Model reply.
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Role name as used by chat completion APIs.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s,
        }
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::User(s.to_string())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::User(s)
    }
}
