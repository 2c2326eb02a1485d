// src/lib.rs

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod frontend;
pub mod fs;
pub mod guard;
pub mod job;
pub mod logging;
pub mod postprocess;
pub mod types;
pub mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{JobController, JobEvent, JobOutcome, JobSummary};
use crate::frontend::{FrontEnd, TerminalConfirm};
use crate::fs::{FileSystem, RealFileSystem};
use crate::guard::OverwriteGuard;
use crate::job::{JobRequest, JobSpecBuilder};
use crate::types::OverwritePolicy;
use crate::workflow::{Workflow, WorkflowKind};

/// Process exit code for a job cancelled with Ctrl-C.
pub const EXIT_CANCELLED: i32 = 130;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// For `run` this wires together:
/// - config loading
/// - the job controller and its event channel
/// - overwrite confirmations according to the configured policy
/// - Ctrl-C handling (cancels the running job)
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_and_validate(PathBuf::from(&args.config))?;

    match args.command {
        Command::List { workflow } => {
            match workflow {
                Some(kind) => print_workflow(kind.descriptor()),
                None => WorkflowKind::ALL
                    .iter()
                    .for_each(|kind| print_workflow(kind.descriptor())),
            }
            Ok(0)
        }
        Command::Run(run_args) if run_args.dry_run => Ok(dry_run(&cfg, &run_args)),
        Command::Run(run_args) => run_job(&cfg, run_args).await,
    }
}

/// Build a request from CLI arguments.
pub fn request_from_args(args: &RunArgs) -> JobRequest {
    let mut request = JobRequest::new(args.workflow, args.workdir.clone());
    request.kinds = args.kinds.clone();
    request.selections = [args.sel1.clone(), args.sel2.clone(), args.sel3.clone()];
    request.params = args.params.iter().cloned().collect();
    request.flags = args.flags.iter().cloned().collect();
    request.topology = args.topology.clone();
    request.trajectory = args.trajectory.clone();
    request.reference = args.reference.clone();
    request
}

async fn run_job(cfg: &ConfigFile, args: RunArgs) -> Result<i32> {
    let policy = if args.yes {
        OverwritePolicy::Always
    } else if args.no {
        OverwritePolicy::Never
    } else {
        cfg.overwrite.policy
    };

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let dispatcher = postprocess::from_config(&cfg.render, fs.clone());
    let (event_tx, mut event_rx) = mpsc::channel::<JobEvent>(256);
    let mut controller = JobController::new(cfg, fs, dispatcher, event_tx);

    // Ctrl-C handling: every press cancels the running job.
    let (interrupt_tx, mut interrupt_rx) = mpsc::channel::<()>(4);
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            if interrupt_tx.send(()).await.is_err() {
                return;
            }
        }
    });

    let workflow = args.workflow;
    controller.submit(request_from_args(&args))?;

    let frontend = FrontEnd::new(policy, Arc::new(TerminalConfirm));
    let summary = frontend
        .drive(&mut controller, workflow, &mut event_rx, &mut interrupt_rx)
        .await;
    let Some(summary) = summary else {
        return Ok(1);
    };
    Ok(report_summary(&summary))
}

/// Print the outcome and map it to an exit code.
fn report_summary(summary: &JobSummary) -> i32 {
    let workflow = summary.workflow;
    match &summary.outcome {
        JobOutcome::Succeeded { post } => {
            eprintln!("{workflow} job completed successfully");
            for warning in post.warnings() {
                eprintln!("warning: {warning}");
            }
            if let Some(report) = &post.report {
                eprintln!("report: {}", report.display());
            }
            0
        }
        JobOutcome::Failed { exit_code, tail } => {
            eprintln!("{workflow} job failed: engine exited with code {exit_code}");
            if !tail.is_empty() {
                eprintln!("last engine output:");
                for line in tail {
                    eprintln!("  {line}");
                }
            }
            1
        }
        JobOutcome::Cancelled { escalated } => {
            if *escalated {
                eprintln!("{workflow} job cancelled (engine killed after grace period)");
            } else {
                eprintln!("{workflow} job cancelled");
            }
            EXIT_CANCELLED
        }
        JobOutcome::Rejected(e) => {
            eprintln!("error: {e}");
            1
        }
        JobOutcome::Declined { conflicts } => {
            eprintln!(
                "{workflow} job aborted: {} existing file(s) left untouched",
                conflicts.len()
            );
            1
        }
        JobOutcome::SpawnFailed(message) => {
            eprintln!("{workflow} job could not start: {message}");
            1
        }
    }
}

/// Validate and print what would run, without running it.
fn dry_run(cfg: &ConfigFile, args: &RunArgs) -> i32 {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let builder = JobSpecBuilder::new(cfg, fs.clone());
    let spec = match builder.build(&request_from_args(args)) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let (event_tx, _event_rx) = mpsc::channel(1);
    let conflicts = OverwriteGuard::new(fs, event_tx).conflicts(spec.expected_outputs());

    println!("trajrun dry-run: {}", spec.workflow());
    println!("  bitmask = {}", spec.analysis_bitmask());
    println!("  working dir = {}", spec.working_dir().display());
    println!("  output dir = {}", spec.output_dir().display());
    println!("  script = {}", spec.script_path().display());
    println!("  command: {}", spec.command_line());
    println!();
    println!("expected outputs ({}):", spec.expected_outputs().len());
    for output in spec.expected_outputs().iter() {
        let marker = if conflicts.contains(&output.path) {
            " (exists)"
        } else {
            ""
        };
        println!("  - [{}] {}{marker}", output.owner, output.path.display());
    }

    debug!("dry-run complete (no execution)");
    0
}

fn print_workflow(workflow: &Workflow) {
    println!("{} - {}", workflow.kind, workflow.description);
    println!("  output dir: {}/", workflow.output_subdir);
    println!("  script: {}", workflow.script);
    println!("  kinds:");
    for kind in workflow.kinds {
        let implied = if workflow.implied_bits & kind.bit != 0 {
            " (always)"
        } else {
            ""
        };
        println!("    {:<16} bit {:<3} {}{implied}", kind.id, kind.bit, kind.label);
    }
    if !workflow.params.is_empty() {
        println!("  params:");
        for param in workflow.params {
            let default = param.default.unwrap_or("required");
            println!("    {:<16} {} [{default}]", param.name, param.help);
        }
    }
    if !workflow.flags.is_empty() {
        println!("  flags:");
        for flag in workflow.flags {
            println!("    {:<16} {}", flag.name, flag.help);
        }
    }
    println!();
}
