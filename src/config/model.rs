// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::OverwritePolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// program = "vmd"
/// dispatch_args = ["-dispdev", "text"]
/// script_dir = "TCL"
/// grace_period = "5s"
///
/// [render]
/// plot_command = ["python3", "plot.py"]
///
/// [overwrite]
/// policy = "ask"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: RawEngineSection,

    #[serde(default)]
    pub render: RenderSection,

    #[serde(default)]
    pub overwrite: OverwriteSection,
}

/// `[engine]` section: how the external analysis engine is launched.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEngineSection {
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Flags placed before the script flag, e.g. `-dispdev text`.
    #[serde(default = "default_dispatch_args")]
    pub dispatch_args: Vec<String>,

    #[serde(default = "default_script_flag")]
    pub script_flag: String,

    #[serde(default = "default_args_marker")]
    pub args_marker: String,

    /// Directory holding the engine scripts. Relative paths resolve against
    /// the job's working directory.
    #[serde(default = "default_script_dir")]
    pub script_dir: PathBuf,

    /// Time between SIGTERM and SIGKILL on cancel (e.g. `"5s"`).
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// How long the relays keep draining buffered output after a cancel.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: String,

    /// Engine lines kept for failure diagnostics.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

fn default_program() -> PathBuf {
    PathBuf::from("vmd")
}

fn default_dispatch_args() -> Vec<String> {
    vec!["-dispdev".to_string(), "text".to_string()]
}

fn default_script_flag() -> String {
    "-e".to_string()
}

fn default_args_marker() -> String {
    "-args".to_string()
}

fn default_script_dir() -> PathBuf {
    PathBuf::from("TCL")
}

fn default_grace_period() -> String {
    "5s".to_string()
}

fn default_drain_timeout() -> String {
    "2s".to_string()
}

fn default_tail_lines() -> usize {
    10
}

impl Default for RawEngineSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            dispatch_args: default_dispatch_args(),
            script_flag: default_script_flag(),
            args_marker: default_args_marker(),
            script_dir: default_script_dir(),
            grace_period: default_grace_period(),
            drain_timeout: default_drain_timeout(),
            tail_lines: default_tail_lines(),
        }
    }
}

/// `[render]` section: post-processing collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderSection {
    /// External plot command; plots are skipped with a warning when empty.
    #[serde(default)]
    pub plot_command: Vec<String>,

    /// External report command; the built-in HTML assembler is used when empty.
    #[serde(default)]
    pub report_command: Vec<String>,

    #[serde(default = "default_report_extension")]
    pub report_extension: String,
}

fn default_report_extension() -> String {
    "html".to_string()
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            plot_command: Vec::new(),
            report_command: Vec::new(),
            report_extension: default_report_extension(),
        }
    }
}

/// `[overwrite]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OverwriteSection {
    #[serde(default)]
    pub policy: OverwritePolicy,
}

/// Validated configuration. Build it through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub engine: EngineConfig,
    pub render: RenderSection,
    pub overwrite: OverwriteSection,
}

/// `[engine]` with durations parsed.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub dispatch_args: Vec<String>,
    pub script_flag: String,
    pub args_marker: String,
    pub script_dir: PathBuf,
    pub grace_period: Duration,
    pub drain_timeout: Duration,
    pub tail_lines: usize,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineConfig,
        render: RenderSection,
        overwrite: OverwriteSection,
    ) -> Self {
        Self {
            engine,
            render,
            overwrite,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            dispatch_args: default_dispatch_args(),
            script_flag: default_script_flag(),
            args_marker: default_args_marker(),
            script_dir: default_script_dir(),
            grace_period: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(2),
            tail_lines: default_tail_lines(),
        }
    }
}
