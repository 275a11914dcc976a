//! `.env` file parsing. Values are only collected here; [`crate::load_and_apply`] decides
//! what reaches the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    Some(dir.join(".env")).filter(|p| p.is_file())
}

/// Strips one pair of matching quotes. Double quotes unescape `\"` and `\n`.
fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return raw[1..raw.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\n", "\n");
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }
    raw.to_string()
}

/// One `KEY=VALUE` line; `export KEY=VALUE` is accepted. Comments and blanks yield `None`.
fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

pub(crate) fn parse_dotenv(content: &str) -> HashMap<String, String> {
    content.lines().filter_map(parse_line).collect()
}

/// Reads `.env` from `override_dir` or the current directory. Missing file yields an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match dotenv_path(override_dir) {
        Some(path) => Ok(parse_dotenv(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(m: &'a HashMap<String, String>, k: &str) -> Option<&'a str> {
        m.get(k).map(String::as_str)
    }

    #[test]
    fn plain_and_exported_pairs() {
        let m = parse_dotenv("OPENAI_API_KEY=sk-test\nexport STAGELOOP_MODEL = gpt-4o\n");
        assert_eq!(get(&m, "OPENAI_API_KEY"), Some("sk-test"));
        assert_eq!(get(&m, "STAGELOOP_MODEL"), Some("gpt-4o"));
    }

    #[test]
    fn comments_blanks_and_junk_skipped() {
        let m = parse_dotenv("# settings\n\nNO_EQUALS\n=orphan\nBAD KEY=x\nKEY=val # kept\n");
        assert_eq!(m.len(), 1);
        assert_eq!(get(&m, "KEY"), Some("val # kept"));
    }

    #[test]
    fn quoting_rules() {
        let m = parse_dotenv(
            "A=\"hello world\"\nB='single $x'\nC=\"say \\\"hi\\\"\"\nD=\"\"\nE=\nF=\"two\\nlines\"\n",
        );
        assert_eq!(get(&m, "A"), Some("hello world"));
        assert_eq!(get(&m, "B"), Some("single $x"));
        assert_eq!(get(&m, "C"), Some("say \"hi\""));
        assert_eq!(get(&m, "D"), Some(""));
        assert_eq!(get(&m, "E"), Some(""));
        assert_eq!(get(&m, "F"), Some("two\nlines"));
    }

    #[test]
    fn later_line_wins() {
        let m = parse_dotenv("K=1\nK=2\n");
        assert_eq!(get(&m, "K"), Some("2"));
    }

    #[test]
    fn file_loading() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
        std::fs::write(dir.path().join(".env"), "STAGELOOP_MAX_STEPS=4\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(get(&m, "STAGELOOP_MAX_STEPS"), Some("4"));
    }
}
