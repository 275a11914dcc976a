//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! Values may be strings, integers, floats or booleans; the latter three are stored in
//! their TOML text form, so `STAGELOOP_MAX_STEPS = 8` works as well as `"8"`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// Base config directory: `$XDG_CONFIG_HOME` when set and non-empty, else the platform default.
pub fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir().ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into()))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, toml::Value>,
}

fn value_to_env(key: &str, value: toml::Value) -> Result<String, LoadError> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(LoadError::XdgValue {
            key: key.to_string(),
            kind: other.type_str().to_string(),
        }),
    }
}

/// Reads `<base>/<app_name>/config.toml`. A missing file yields an empty map.
pub fn load_env_map_from(base: &Path, app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = base.join(app_name).join("config.toml");
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(LoadError::XdgRead(e)),
    };
    let file: ConfigFile = toml::from_str(&content)?;
    file.env
        .into_iter()
        .map(|(k, v)| value_to_env(&k, v).map(|v| (k, v)))
        .collect()
}

/// Reads the `[env]` table for `app_name` under [`config_home`].
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    load_env_map_from(&config_home()?, app_name)
}
