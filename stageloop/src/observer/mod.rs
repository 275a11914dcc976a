//! Run observers: sinks the loop notifies at fixed points of a run.
//!
//! The loop never writes files itself. Anything that wants a record of a run (a Markdown
//! transcript, a UI, a test probe) implements [`RunObserver`] and is attached with
//! [`Agent::with_observer`](crate::Agent::with_observer). Observer failures are logged with
//! `warn!` and never abort the run.

mod transcript;

pub use transcript::MarkdownTranscript;

use serde::Serialize;

use crate::agent::StopReason;
use crate::state::{ActionRecord, Stage};

/// Something that happened during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Emitted once, before the first stage.
    RunStarted {
        run_id: String,
        task: String,
        max_steps: u32,
    },
    /// A stage became current.
    StageStarted { stage: Stage, step: u32 },
    /// A stage produced its output.
    ///
    /// `heading` and `content` are display-ready: e.g. `"Decision"` and
    /// `Next move: {"tool":"search"}`.
    StageFinished {
        stage: Stage,
        step: u32,
        heading: String,
        content: String,
    },
    /// The reflect stage completed the last action record.
    ActionRecorded { step: u32, action: ActionRecord },
    /// The final answer was produced.
    RunFinished {
        run_id: String,
        stop: StopReason,
        steps_used: u32,
        answer: String,
    },
}

/// Error raised by an observer. Logged by the loop, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("observer I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("observer failed: {0}")]
    Other(String),
}

/// Receives [`RunEvent`]s in order for every run of the agent it is attached to.
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent) -> Result<(), ObserverError>;
}

/// Any `Fn(&RunEvent)` closure is an observer that never fails.
impl<F> RunObserver for F
where
    F: Fn(&RunEvent) + Send + Sync,
{
    fn on_event(&self, event: &RunEvent) -> Result<(), ObserverError> {
        self(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_observers() {
        let seen = Mutex::new(Vec::new());
        let obs = |e: &RunEvent| seen.lock().unwrap().push(e.clone());
        obs.on_event(&RunEvent::StageStarted {
            stage: Stage::Plan,
            step: 1,
        })
        .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let v = serde_json::to_value(RunEvent::StageStarted {
            stage: Stage::Decide,
            step: 2,
        })
        .unwrap();
        assert_eq!(v["type"], "stage_started");
        assert_eq!(v["stage"], "decide");
        assert_eq!(v["step"], 2);
    }
}
