//! Markdown transcript of a run, one section per stage.
//!
//! Layout:
//! - plan and reflect: `# Heading` followed by the content;
//! - decide and describe: `## Heading` followed by the content;
//! - execute and final: `### Heading` followed by the content in a code fence.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::state::Stage;

use super::{ObserverError, RunEvent, RunObserver};

/// Writes stage output as Markdown to a file, truncating it when a run starts.
#[derive(Debug)]
pub struct MarkdownTranscript {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl MarkdownTranscript {
    /// Transcript at `path`. Nothing is written until the first run starts.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Formats one finished stage as a Markdown section.
    pub fn format_section(stage: Stage, heading: &str, content: &str) -> String {
        match stage {
            Stage::Plan | Stage::Reflect => format!("# {}\n{}\n", heading, content),
            Stage::Decide | Stage::Describe => format!("## {}\n{}\n", heading, content),
            Stage::Execute | Stage::Final => format!("### {}\n```\n{}\n```\n", heading, content),
            Stage::Init => format!("{}\n", content),
        }
    }

    fn truncate(&self) -> Result<(), ObserverError> {
        let file = File::create(&self.path)?;
        *self.lock() = Some(file);
        Ok(())
    }

    fn append(&self, text: &str) -> Result<(), ObserverError> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(text.as_bytes())?;
            file.flush()?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RunObserver for MarkdownTranscript {
    fn on_event(&self, event: &RunEvent) -> Result<(), ObserverError> {
        match event {
            RunEvent::RunStarted { .. } => self.truncate(),
            RunEvent::StageFinished {
                stage,
                heading,
                content,
                ..
            } => self.append(&Self::format_section(*stage, heading, content)),
            RunEvent::RunFinished { .. } => {
                *self.lock() = None;
                Ok(())
            }
            RunEvent::StageStarted { .. } | RunEvent::ActionRecorded { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StopReason;

    fn started() -> RunEvent {
        RunEvent::RunStarted {
            run_id: "r".into(),
            task: "t".into(),
            max_steps: 3,
        }
    }

    fn finished(stage: Stage, heading: &str, content: &str) -> RunEvent {
        RunEvent::StageFinished {
            stage,
            step: 1,
            heading: heading.into(),
            content: content.into(),
        }
    }

    #[test]
    fn sections_use_stage_levels() {
        assert_eq!(
            MarkdownTranscript::format_section(Stage::Plan, "Planning", "Current plan: x"),
            "# Planning\nCurrent plan: x\n"
        );
        assert_eq!(
            MarkdownTranscript::format_section(Stage::Decide, "Decision", "Next move: {}"),
            "## Decision\nNext move: {}\n"
        );
        assert_eq!(
            MarkdownTranscript::format_section(Stage::Execute, "Execution", "Action result: \"ok\""),
            "### Execution\n```\nAction result: \"ok\"\n```\n"
        );
    }

    #[test]
    fn run_start_truncates_previous_transcript() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.md");
        std::fs::write(&path, "stale content\n").unwrap();

        let t = MarkdownTranscript::new(&path);
        t.on_event(&started()).unwrap();
        t.on_event(&finished(Stage::Plan, "Planning", "Current plan: a")).unwrap();
        t.on_event(&finished(Stage::Reflect, "Reflection", "went fine")).unwrap();
        t.on_event(&RunEvent::RunFinished {
            run_id: "r".into(),
            stop: StopReason::FinalAnswerSelected,
            steps_used: 1,
            answer: "42".into(),
        })
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "# Planning\nCurrent plan: a\n# Reflection\nwent fine\n");
    }

    #[test]
    fn second_run_starts_fresh() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.md");
        let t = MarkdownTranscript::new(&path);
        t.on_event(&started()).unwrap();
        t.on_event(&finished(Stage::Plan, "Planning", "one")).unwrap();
        t.on_event(&started()).unwrap();
        t.on_event(&finished(Stage::Plan, "Planning", "two")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Planning\ntwo\n");
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let t = MarkdownTranscript::new("/nonexistent_dir_98765/log.md");
        assert!(matches!(t.on_event(&started()), Err(ObserverError::Io(_))));
    }
}
