// src/errors.rs

//! Crate-wide error types.
//!
//! The taxonomy follows the job lifecycle:
//! - [`ValidationError`]: bad or missing input, detected before anything
//!   touches the filesystem or spawns a process.
//! - [`SpawnError`]: the analysis engine could not be launched.
//! - [`PostProcessingError`]: a plot or report could not be produced. These
//!   are isolated per analysis kind and only ever surface as warnings.
//!
//! A non-zero engine exit and a user cancellation are *outcomes*, not errors;
//! see [`crate::engine::JobOutcome`].

use std::path::PathBuf;

use thiserror::Error;

use crate::workflow::WorkflowKind;

#[derive(Error, Debug)]
pub enum TrajrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error("a {0} job is already running")]
    AlreadyRunning(WorkflowKind),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// First unmet precondition found while turning a request into a `JobSpec`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown analysis kind '{kind}' for the {workflow} workflow")]
    UnknownKind { workflow: WorkflowKind, kind: String },

    #[error("unknown flag '{flag}' for the {workflow} workflow")]
    UnknownFlag { workflow: WorkflowKind, flag: String },

    #[error("unknown parameter '{param}' for the {workflow} workflow")]
    UnknownParameter { workflow: WorkflowKind, param: String },

    #[error("no analyses selected; select at least one analysis option")]
    NoAnalysisSelected,

    #[error("'{first}' and '{second}' cannot be requested together")]
    ConflictingKinds { first: String, second: String },

    #[error("selection {slot} is required by '{kind}'")]
    MissingSelection { slot: usize, kind: String },

    #[error("invalid value for '{param}': '{value}' (expected {expected})")]
    InvalidNumber {
        param: String,
        value: String,
        expected: &'static str,
    },

    #[error("parameter '{param}' is required")]
    MissingParameter { param: String },

    #[error("{what} is not loaded")]
    MissingInput { what: &'static str },

    #[error("{what} not found at {}", path.display())]
    InputNotFound { what: &'static str, path: PathBuf },
}

/// The engine binary could not be launched (missing, not executable, ...).
#[derive(Error, Debug)]
#[error("failed to launch '{}': {source}", program.display())]
pub struct SpawnError {
    pub program: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure to produce one derived artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostProcessingError {
    #[error("no plot renderer configured; skipped plots for '{kind}'")]
    RendererUnavailable { kind: String },

    #[error("plot for '{kind}' failed: {message}")]
    PlotFailed { kind: String, message: String },

    #[error("plot for '{kind}' panicked: {message}")]
    PlotPanicked { kind: String, message: String },

    #[error("report {} failed: {message}", path.display())]
    ReportFailed { path: PathBuf, message: String },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TrajrunError>;
