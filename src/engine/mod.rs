// src/engine/mod.rs

//! Job orchestration engine.
//!
//! This module ties together:
//! - the pure job state machine ([`core`]),
//! - the per-job worker that validates, guards, spawns, relays and
//!   post-processes ([`worker`]),
//! - the controller owned by the front-end, which starts workers and keeps
//!   at most one active job per workflow ([`controller`]).
//!
//! Everything a front-end needs to know about a job arrives as a
//! [`JobEvent`] on a single bounded channel.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::errors::ValidationError;
use crate::exec::OutputLine;
use crate::postprocess::PostProcessReport;
use crate::workflow::WorkflowKind;

/// Identifier handed out by the controller, unique per process lifetime.
pub type JobId = u64;

/// Lifecycle state of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Validating,
    AwaitingOverwriteDecision,
    Running,
    Cancelling,
    CompletedSuccess,
    CompletedCancelled,
    /// `None` when the engine could not be launched at all.
    Failed { exit_code: Option<i32> },
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::CompletedSuccess | JobState::CompletedCancelled | JobState::Failed { .. }
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Idle => f.write_str("idle"),
            JobState::Validating => f.write_str("validating"),
            JobState::AwaitingOverwriteDecision => f.write_str("awaiting overwrite decision"),
            JobState::Running => f.write_str("running"),
            JobState::Cancelling => f.write_str("cancelling"),
            JobState::CompletedSuccess => f.write_str("completed"),
            JobState::CompletedCancelled => f.write_str("cancelled"),
            JobState::Failed { exit_code: Some(code) } => write!(f, "failed (exit code {code})"),
            JobState::Failed { exit_code: None } => f.write_str("failed (not started)"),
        }
    }
}

/// How a job ended. Exactly one per job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded { post: PostProcessReport },
    Failed { exit_code: i32, tail: Vec<String> },
    Cancelled { escalated: bool },
    Rejected(ValidationError),
    Declined { conflicts: Vec<PathBuf> },
    SpawnFailed(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}

#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job: JobId,
    pub workflow: WorkflowKind,
    pub outcome: JobOutcome,
}

/// Everything a worker reports back to the front-end.
#[derive(Debug)]
pub enum JobEvent {
    StateChanged {
        job: JobId,
        workflow: WorkflowKind,
        state: JobState,
    },
    /// One engine line, in per-stream order.
    Output { job: JobId, line: OutputLine },
    /// The worker is blocked until `reply` is answered. `true` overwrites,
    /// `false` (or dropping `reply`) aborts the job.
    OverwriteRequested {
        job: JobId,
        workflow: WorkflowKind,
        paths: Vec<PathBuf>,
        reply: oneshot::Sender<bool>,
    },
    Finished(JobSummary),
}

pub mod controller;
pub mod core;
pub mod worker;

pub use controller::JobController;
pub use self::core::{InvalidTransition, JobInput, JobMachine};
