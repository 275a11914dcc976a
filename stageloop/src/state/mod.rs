//! Run state for the staged agent loop.
//!
//! One [`RunState`] exists per call to [`Agent::process`](crate::Agent::process); the loop
//! owns it and hands `&mut` to each stage function in turn.
//!
//! # Main types
//!
//! - [`RunState`]: stage, step counters, seeded messages, plan, active tool and action log.
//! - [`Stage`]: `init → plan → decide → describe → execute → reflect → … → final`.
//! - [`ActiveTool`]: the tool chosen by the decide stage.
//! - [`ActionRecord`]: one execute stage outcome, annotated by the following reflect stage.

mod run_state;

pub use run_state::{ActionRecord, ActiveTool, RunState, Stage};
