//! Load stage prompt templates from a directory and fall back to the embedded defaults.
//!
//! **Canonical source**: default templates live in `stageloop/prompts/stages.yaml` and are
//! embedded at compile time. A prompts directory may contain its own `stages.yaml`
//! overriding any subset of the keys `plan`, `decide`, `describe`, `reflect`, `final_answer`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{AgentPrompts, PromptStage, StagePrompt, TemplatePrompt};

const EMBED_STAGES: &str = include_str!("../../prompts/stages.yaml");

/// Name of the YAML file under the prompts directory.
const STAGES_FILE: &str = "stages.yaml";

/// Env var naming the prompts directory when none is passed explicitly.
pub const PROMPTS_DIR_ENV: &str = "STAGELOOP_PROMPTS_DIR";

/// Error when loading prompts from a directory.
#[derive(Debug, thiserror::Error)]
pub enum PromptLoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
    #[error("invalid template for stage `{stage}` in {path}: {message}")]
    Template {
        path: String,
        stage: &'static str,
        message: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct StagesFile {
    plan: Option<String>,
    decide: Option<String>,
    describe: Option<String>,
    reflect: Option<String>,
    final_answer: Option<String>,
}

impl StagesFile {
    fn get(&self, stage: PromptStage) -> Option<&str> {
        match stage {
            PromptStage::Plan => self.plan.as_deref(),
            PromptStage::Decide => self.decide.as_deref(),
            PromptStage::Describe => self.describe.as_deref(),
            PromptStage::Reflect => self.reflect.as_deref(),
            PromptStage::FinalAnswer => self.final_answer.as_deref(),
        }
    }
}

fn prompts_dir(dir: Option<&Path>) -> Option<PathBuf> {
    dir.map(Path::to_path_buf)
        .or_else(|| std::env::var(PROMPTS_DIR_ENV).ok().map(PathBuf::from))
}

fn read_stages_file(dir: &Path) -> Result<Option<StagesFile>, PromptLoadError> {
    let path = dir.join(STAGES_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PromptLoadError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| PromptLoadError::ParseYaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Default prompts parsed from the embedded `stages.yaml`.
pub fn default_from_embedded() -> AgentPrompts {
    let file: StagesFile = serde_yaml::from_str(EMBED_STAGES).unwrap_or_default();
    let slot = |stage: PromptStage| -> StagePrompt {
        TemplatePrompt::new(file.get(stage).unwrap_or_default()).into()
    };
    AgentPrompts {
        plan: slot(PromptStage::Plan),
        decide: slot(PromptStage::Decide),
        describe: slot(PromptStage::Describe),
        reflect: slot(PromptStage::Reflect),
        final_answer: slot(PromptStage::FinalAnswer),
    }
}

/// Loads prompts from `dir` (or `STAGELOOP_PROMPTS_DIR`), overriding the embedded defaults
/// for every key present in its `stages.yaml`.
///
/// A directory without `stages.yaml` yields the defaults. Templates are compiled here, so a
/// broken template fails the load rather than the run.
pub fn load(dir: Option<&Path>) -> Result<AgentPrompts, PromptLoadError> {
    let base = prompts_dir(dir).ok_or_else(|| {
        PromptLoadError::DirNotFound(format!("no directory given and {} unset", PROMPTS_DIR_ENV))
    })?;
    if !base.is_dir() {
        return Err(PromptLoadError::DirNotFound(base.display().to_string()));
    }
    let mut prompts = default_from_embedded();
    let Some(file) = read_stages_file(&base)? else {
        return Ok(prompts);
    };
    for stage in PromptStage::ALL {
        if let Some(source) = file.get(stage) {
            let template =
                TemplatePrompt::parse(source).map_err(|e| PromptLoadError::Template {
                    path: base.join(STAGES_FILE).display().to_string(),
                    stage: stage.key(),
                    message: e.to_string(),
                })?;
            prompts = prompts.with(stage, template);
        }
    }
    Ok(prompts)
}

/// [`load`] when a directory is available, else the embedded defaults.
pub fn load_or_default(dir: Option<&Path>) -> AgentPrompts {
    load(dir).unwrap_or_else(|_| default_from_embedded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::state::RunState;
    use crate::tools::ToolRegistry;

    #[test]
    fn embedded_file_defines_every_stage() {
        let file: StagesFile = serde_yaml::from_str(EMBED_STAGES).unwrap();
        for stage in PromptStage::ALL {
            let source = file.get(stage).unwrap_or_else(|| panic!("missing {}", stage.key()));
            TemplatePrompt::parse(source).unwrap();
        }
    }

    #[tokio::test]
    async fn embedded_prompts_render_catalogue_and_actions() {
        let prompts = default_from_embedded();
        let state = RunState::new(Message::user("check the site"), 5);
        let tools = ToolRegistry::new();
        for stage in PromptStage::ALL {
            let out = prompts.get(stage).resolve(&state, &tools).await.unwrap();
            assert!(!out.trim().is_empty(), "{} rendered empty", stage.key());
        }
        let plan = prompts.plan.resolve(&state, &tools).await.unwrap();
        assert!(plan.contains("- final_answer: "), "{}", plan);
        assert!(plan.contains(super::super::NO_ACTIONS_MARKER), "{}", plan);
        assert!(plan.contains("check the site"), "{}", plan);
    }

    #[test]
    fn load_nonexistent_dir_returns_error() {
        let result = load(Some(Path::new("/nonexistent_prompts_dir_12345")));
        assert!(matches!(result, Err(PromptLoadError::DirNotFound(_))));
    }

    #[tokio::test]
    async fn load_overrides_only_present_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(STAGES_FILE),
            "decide: \"DECIDE {{ step }}\"\n",
        )
        .unwrap();
        let prompts = load(Some(temp.path())).unwrap();
        let state = RunState::new(Message::user("t"), 1);
        let tools = ToolRegistry::new();
        assert_eq!(prompts.decide.resolve(&state, &tools).await.unwrap(), "DECIDE 1");
        let plan = prompts.plan.resolve(&state, &tools).await.unwrap();
        assert!(plan.contains("<available_tools>"));
    }

    #[test]
    fn load_invalid_yaml_returns_parse_error() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(STAGES_FILE), "plan: [not closed").unwrap();
        let err = load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, PromptLoadError::ParseYaml { .. }));
    }

    #[test]
    fn load_invalid_template_names_stage() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(STAGES_FILE), "reflect: \"{% if %}\"\n").unwrap();
        let err = load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, PromptLoadError::Template { stage: "reflect", .. }));
    }

    #[test]
    fn load_dir_without_file_uses_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let prompts = load(Some(temp.path())).unwrap();
        assert!(matches!(prompts.plan, StagePrompt::Builder(_)));
    }
}
