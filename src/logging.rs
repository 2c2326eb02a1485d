// src/logging.rs

//! Logging for `trajrun`.
//!
//! Two sinks exist side by side:
//! - the global `tracing` subscriber installed by [`init_logging`], and
//! - one [`JobLog`] per job: an append-only text file in the job's output
//!   directory that records the command line, every engine line and the
//!   outcome.
//!
//! Priority for determining the global log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `TRAJRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout carries engine output only.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;
use crate::exec::OutputStream;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("TRAJRUN_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    // Send logs to stderr; keep stdout free for engine output.
    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Append-only log file scoped to one job.
///
/// Each record is `timestamp - LEVEL - message` with an RFC 3339 UTC
/// timestamp. Records are mirrored to `tracing`; engine lines only at
/// `debug` since the front-end already shows them. Clones share the file.
#[derive(Debug, Clone)]
pub struct JobLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl JobLog {
    /// Open (or create) the log file in append mode.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: &str) {
        info!(log = %self.path.display(), "{message}");
        self.record("INFO", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(log = %self.path.display(), "{message}");
        self.record("WARNING", message);
    }

    pub fn error(&self, message: &str) {
        error!(log = %self.path.display(), "{message}");
        self.record("ERROR", message);
    }

    /// One line of engine output.
    pub fn engine_line(&self, stream: OutputStream, text: &str) {
        debug!(log = %self.path.display(), %stream, "{text}");
        let level = match stream {
            OutputStream::Stdout => "STDOUT",
            OutputStream::Stderr => "STDERR",
        };
        self.record(level, text);
    }

    fn record(&self, level: &str, message: &str) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string());
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(file, "{timestamp} - {level} - {message}") {
            warn!(log = %self.path.display(), error = %e, "failed to write job log");
        }
    }
}
