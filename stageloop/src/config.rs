//! Agent configuration resolved from the process environment.
//!
//! Call `config::load_and_apply("stageloop", None)` first if `.env` or
//! `$XDG_CONFIG_HOME/stageloop/config.toml` should contribute; this module only reads
//! `std::env`.

use std::path::PathBuf;

use serde::Serialize;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_STEPS: u32 = 15;

pub const ENV_MODEL: &str = "STAGELOOP_MODEL";
pub const ENV_MAX_STEPS: &str = "STAGELOOP_MAX_STEPS";
pub const ENV_STRICT_PAYLOADS: &str = "STAGELOOP_STRICT_PAYLOADS";
pub const ENV_PROMPTS_DIR: &str = crate::prompts::PROMPTS_DIR_ENV;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_steps must be a positive integer, got `{0}`")]
    InvalidMaxSteps(String),
    #[error("{var} must be one of 1/true/yes/0/false/no, got `{value}`")]
    InvalidFlag { var: &'static str, value: String },
}

/// Settings for one [`Agent`](crate::Agent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentConfig {
    /// Model name passed to the completion client.
    pub model: String,
    /// Iteration ceiling; at least 1.
    pub max_steps: u32,
    /// Validate describe payloads against tool input schemas.
    pub strict_payloads: bool,
    /// Directory holding a `stages.yaml` prompt override.
    pub prompts_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            strict_payloads: false,
            prompts_dir: None,
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `STAGELOOP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(model) = lookup(ENV_MODEL).filter(|s| !s.trim().is_empty()) {
            cfg.model = model.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_STEPS) {
            cfg.max_steps = parse_max_steps(&raw)?;
        }
        if let Some(raw) = lookup(ENV_STRICT_PAYLOADS) {
            cfg.strict_payloads = parse_flag(ENV_STRICT_PAYLOADS, &raw)?;
        }
        if let Some(dir) = lookup(ENV_PROMPTS_DIR).filter(|s| !s.trim().is_empty()) {
            cfg.prompts_dir = Some(PathBuf::from(dir));
        }
        Ok(cfg)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the iteration ceiling; zero is rejected.
    pub fn with_max_steps(mut self, max_steps: u32) -> Result<Self, ConfigError> {
        if max_steps == 0 {
            return Err(ConfigError::InvalidMaxSteps("0".to_string()));
        }
        self.max_steps = max_steps;
        Ok(self)
    }

    pub fn with_strict_payloads(mut self, strict: bool) -> Self {
        self.strict_payloads = strict;
        self
    }

    pub fn with_prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompts_dir = Some(dir.into());
        self
    }
}

/// Parses a positive step ceiling.
pub fn parse_max_steps(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidMaxSteps(raw.to_string())),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: raw.to_string(),
        }),
    }
}
