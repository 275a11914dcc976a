//! Environment loading for stageloop binaries.
//!
//! Two optional sources feed the process environment before `stageloop::AgentConfig`
//! reads it:
//!
//! - project `.env` (current directory, or an explicit directory);
//! - `$XDG_CONFIG_HOME/<app>/config.toml`, table `[env]`.
//!
//! Priority: **existing env > .env > XDG**. A variable already set is never overwritten.
//!
//! ```toml
//! # ~/.config/stageloop/config.toml
//! [env]
//! OPENAI_API_KEY = "sk-..."
//! STAGELOOP_MODEL = "gpt-4o-mini"
//! STAGELOOP_MAX_STEPS = 15
//! ```

mod dotenv;
mod xdg_toml;

pub use xdg_toml::config_home;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("xdg [env] value for `{key}` must be a string, number or boolean, got {kind}")]
    XdgValue { key: String, kind: String },
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Values to set: keys from `.env` and XDG that `is_set` reports as absent, `.env` first.
fn merge_missing<F>(
    dotenv: HashMap<String, String>,
    xdg: HashMap<String, String>,
    is_set: F,
) -> HashMap<String, String>
where
    F: Fn(&str) -> bool,
{
    let mut out = xdg;
    out.extend(dotenv);
    out.retain(|k, _| !is_set(k));
    out
}

/// Loads `.env` and the XDG `[env]` table for `app_name`, and sets every variable that is
/// not already present in the process environment.
///
/// * `override_dir`: look for `.env` here instead of the current directory.
///
/// Returns the names of the variables that were set.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<Vec<String>, LoadError> {
    let xdg = xdg_toml::load_env_map(app_name)?;
    let dotenv = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;
    let pending = merge_missing(dotenv, xdg, |k| std::env::var_os(k).is_some());

    let mut applied: Vec<String> = Vec::with_capacity(pending.len());
    for (key, value) in pending {
        std::env::set_var(&key, value);
        applied.push(key);
    }
    applied.sort();
    Ok(applied)
}
