// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::workflow::WorkflowKind;

/// Command-line arguments for `trajrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "trajrun",
    version,
    about = "Run trajectory post-processing jobs through an external analysis engine.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Trajrun.toml` in the current working directory. Built-in
    /// defaults are used when the file does not exist.
    #[arg(long, value_name = "PATH", default_value = "Trajrun.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TRAJRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate a job, run the engine and post-process its results.
    Run(RunArgs),
    /// Show workflows with their analysis kinds, parameters and flags.
    List {
        /// Only show this workflow.
        workflow: Option<WorkflowKind>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// analysis, contacts, secondary or backmapping.
    pub workflow: WorkflowKind,

    /// Project directory; outputs go to a workflow sub-directory of it.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    #[arg(long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// Reference structure; the engine receives `None` when omitted.
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// First selection.
    #[arg(long, value_name = "SEL", default_value = "")]
    pub sel1: String,

    /// Second selection.
    #[arg(long, value_name = "SEL", default_value = "")]
    pub sel2: String,

    /// Third selection; falls back to the second when empty.
    #[arg(long, value_name = "SEL", default_value = "")]
    pub sel3: String,

    /// Analysis kind to run (repeatable or comma separated).
    #[arg(long = "kind", value_name = "KIND", value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Boolean workflow flag such as `report` (repeatable).
    #[arg(long = "flag", value_name = "FLAG", value_delimiter = ',')]
    pub flags: Vec<String>,

    /// Workflow parameter (repeatable), e.g. `--param skip=2`.
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Overwrite existing outputs without asking.
    #[arg(long, short = 'y', conflicts_with = "no")]
    pub yes: bool,

    /// Never overwrite existing outputs; abort instead.
    #[arg(long)]
    pub no: bool,

    /// Validate and print the engine command line and expected outputs, but
    /// don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
