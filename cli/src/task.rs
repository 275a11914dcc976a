//! One task run: resolve config, build the agent, run, render the output.

use std::path::PathBuf;
use std::sync::Arc;

use stageloop::{
    Agent, AgentConfig, AgentError, ChatOpenAI, ConfigError, MarkdownTranscript, PromptLoadError,
    ToolRegistry, WebFetcherTool,
};
use thiserror::Error;

/// Options for one run, as parsed from the command line.
#[derive(Clone, Debug, Default)]
pub struct TaskOptions {
    pub task: String,
    pub model: Option<String>,
    pub max_steps: Option<u32>,
    pub strict: bool,
    pub prompts_dir: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub json: bool,
    pub no_web: bool,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no task given")]
    EmptyTask,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("prompts: {0}")]
    Prompts(#[from] PromptLoadError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Environment config with command-line overrides applied.
pub fn resolve_config(opts: &TaskOptions, base: AgentConfig) -> Result<AgentConfig, ConfigError> {
    let mut cfg = base;
    if let Some(model) = &opts.model {
        cfg = cfg.with_model(model.clone());
    }
    if let Some(n) = opts.max_steps {
        cfg = cfg.with_max_steps(n)?;
    }
    if opts.strict {
        cfg = cfg.with_strict_payloads(true);
    }
    if let Some(dir) = &opts.prompts_dir {
        cfg = cfg.with_prompts_dir(dir.clone());
    }
    Ok(cfg)
}

fn build_tools(opts: &TaskOptions) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    if !opts.no_web {
        tools.register(WebFetcherTool::new().body_only());
    }
    tools
}

/// Builds the agent for `config`: OpenAI client, tools, prompts and optional transcript.
pub fn build_agent(opts: &TaskOptions, config: AgentConfig) -> Result<Agent, TaskError> {
    let llm = Arc::new(ChatOpenAI::new(config.model.clone()));
    let mut agent = Agent::new(llm, build_tools(opts)).try_with_config(config)?;
    if let Some(path) = &opts.transcript {
        agent = agent.with_observer(Arc::new(MarkdownTranscript::new(path.clone())));
    }
    Ok(agent)
}

/// Runs the task and returns what to print on stdout.
pub async fn run(opts: TaskOptions) -> Result<String, TaskError> {
    if opts.task.trim().is_empty() {
        return Err(TaskError::EmptyTask);
    }
    let config = resolve_config(&opts, AgentConfig::from_env()?)?;
    tracing::info!(model = %config.model, max_steps = config.max_steps, "starting task");
    let agent = build_agent(&opts, config)?;
    let outcome = agent.run(opts.task.as_str()).await?;
    if opts.json {
        Ok(serde_json::to_string_pretty(&outcome)?)
    } else {
        Ok(outcome.answer().to_string())
    }
}
