//! # Stageloop
//!
//! An autonomous task-solving loop: a language model plans, picks a tool, describes the
//! tool's input, the tool runs, and the model reflects on the result. The loop repeats
//! until the model picks the terminal tool `final_answer` or the step budget runs out,
//! then one last completion writes the answer.
//!
//! ## Main modules
//!
//! - [`agent`]: [`Agent`], [`AgentResponse`], [`RunOutcome`], [`StopReason`] — the loop.
//! - [`state`]: [`RunState`], [`Stage`], [`ActionRecord`], [`ActiveTool`] — per-run state.
//! - [`tools`]: [`Tool`], [`ToolRegistry`], [`FnTool`], [`WebFetcherTool`].
//! - [`llm`]: [`LlmClient`], [`MockLlm`], [`ChatOpenAI`], [`Completion`], [`ResponseFormat`].
//! - [`prompts`]: [`AgentPrompts`], [`StagePrompt`], [`PromptBuilder`], minijinja templates.
//! - [`observer`]: [`RunObserver`], [`RunEvent`], [`MarkdownTranscript`].
//! - [`config`]: [`AgentConfig`] from `STAGELOOP_*` environment variables.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stageloop::{Agent, AgentConfig, ChatOpenAI, FnTool, ToolRegistry};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let mut tools = ToolRegistry::new();
//! tools.register(FnTool::new(
//!     "save_answer",
//!     "Save the answer to a question",
//!     r#"Required payload: {"id": "question id", "answer": "answer text"}"#,
//!     |payload| async move { Ok(format!("Saved answer for {}", payload["id"])) },
//! ));
//!
//! let agent = Agent::new(Arc::new(ChatOpenAI::new(config.model.clone())), tools)
//!     .try_with_config(config)?;
//! let response = agent.process("Answer question 01 and save it").await?;
//! println!("{}", response.content());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod observer;
pub mod prompts;
pub mod state;
pub mod tools;

pub use agent::{Agent, AgentResponse, Choice, ChoiceMessage, RunOutcome, StopReason};
pub use config::{AgentConfig, ConfigError};
pub use error::{AgentError, DecisionError};
pub use llm::{complete, ChatOpenAI, Completion, LlmClient, LlmResponse, LlmUsage, MockLlm, ResponseFormat};
pub use message::Message;
pub use observer::{MarkdownTranscript, ObserverError, RunEvent, RunObserver};
pub use prompts::{AgentPrompts, PromptBuilder, PromptLoadError, PromptStage, StagePrompt, TemplatePrompt};
pub use state::{ActionRecord, ActiveTool, RunState, Stage};
pub use tools::{
    FnTool, Tool, ToolError, ToolLookupError, ToolRegistry, ToolSpec, WebFetcherTool,
    TOOL_FINAL_ANSWER, TOOL_WEB_FETCHER,
};

/// When running `cargo test -p stageloop`, initializes tracing from `RUST_LOG` so that
/// unit tests in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
