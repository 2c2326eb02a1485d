// src/engine/core.rs

//! Pure job state machine.
//!
//! [`JobMachine`] consumes [`JobInput`]s and produces the next [`JobState`].
//! It owns no channels, no Tokio types and performs no IO; the worker in
//! [`super::worker`] feeds it and publishes the states it returns.
//!
//! Running transitions:
//! - `Running --exit 0--> CompletedSuccess`
//! - `Running --exit n--> Failed(n)`
//! - `Running --cancel--> Cancelling --process dead--> CompletedCancelled`
//!
//! A cancel that arrives before the engine is spawned ends the job in
//! `CompletedCancelled` directly. Every terminal state resets to `Idle`.

use thiserror::Error;

use super::JobState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobInput {
    Submitted,
    /// Validation failed.
    Rejected,
    /// Some expected outputs already exist.
    ConflictsFound,
    OverwriteDeclined,
    Spawned,
    SpawnFailed,
    CancelRequested,
    Exited { code: i32 },
    /// The process is gone after a cancel.
    ProcessDead,
    Reset,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid job transition: {input:?} in state {from:?}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub input: JobInput,
}

#[derive(Debug, Clone)]
pub struct JobMachine {
    state: JobState,
}

impl Default for JobMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl JobMachine {
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Apply one input. The state is left untouched on error.
    pub fn step(&mut self, input: JobInput) -> Result<JobState, InvalidTransition> {
        use JobInput as I;
        use JobState as S;

        let next = match (self.state, input) {
            (S::Idle, I::Submitted) => S::Validating,

            (S::Validating, I::Rejected) => S::Idle,
            (S::Validating, I::ConflictsFound) => S::AwaitingOverwriteDecision,
            (S::AwaitingOverwriteDecision, I::OverwriteDeclined) => S::Idle,

            (S::Validating | S::AwaitingOverwriteDecision, I::Spawned) => S::Running,
            (S::Validating | S::AwaitingOverwriteDecision, I::SpawnFailed) => {
                S::Failed { exit_code: None }
            }
            (S::Validating | S::AwaitingOverwriteDecision, I::CancelRequested) => {
                S::CompletedCancelled
            }

            (S::Running, I::Exited { code: 0 }) => S::CompletedSuccess,
            (S::Running, I::Exited { code }) => S::Failed {
                exit_code: Some(code),
            },
            (S::Running, I::CancelRequested) => S::Cancelling,

            (S::Cancelling, I::CancelRequested) => S::Cancelling,
            // Once cancelled, the exit code no longer matters.
            (S::Cancelling, I::ProcessDead | I::Exited { .. }) => S::CompletedCancelled,

            // Late cancels are harmless.
            (state, I::CancelRequested) if state == S::Idle || state.is_terminal() => state,

            (state, I::Reset) if state.is_terminal() => S::Idle,

            (from, input) => return Err(InvalidTransition { from, input }),
        };

        self.state = next;
        Ok(next)
    }
}
