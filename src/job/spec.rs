// src/job/spec.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisBitmask, AnalysisKind};
use crate::job::outputs::ExpectedOutputSet;
use crate::workflow::{Workflow, WorkflowKind};

/// Fully validated description of one engine run.
///
/// Built only by [`crate::job::JobSpecBuilder`]. Fields are private and the
/// spec is never mutated after construction; the worker owns it for the
/// lifetime of the job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub(crate) workflow: WorkflowKind,
    pub(crate) engine_path: PathBuf,
    pub(crate) script_path: PathBuf,
    pub(crate) positional_args: Vec<String>,
    pub(crate) working_dir: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) analysis_bitmask: AnalysisBitmask,
    pub(crate) selections: [String; 3],
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) report_path: Option<PathBuf>,
    pub(crate) expected_outputs: ExpectedOutputSet,
}

impl JobSpec {
    pub fn workflow(&self) -> WorkflowKind {
        self.workflow
    }

    pub fn descriptor(&self) -> &'static Workflow {
        self.workflow.descriptor()
    }

    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Arguments after the engine binary, in the engine's calling order.
    pub fn positional_args(&self) -> &[String] {
        &self.positional_args
    }

    /// Directory the engine process is started in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn analysis_bitmask(&self) -> AnalysisBitmask {
        self.analysis_bitmask
    }

    /// Selections after trimming and fallback.
    pub fn selections(&self) -> &[String; 3] {
        &self.selections
    }

    /// Parameter value, defaults applied.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    pub fn expected_outputs(&self) -> &ExpectedOutputSet {
        &self.expected_outputs
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(self.descriptor().log_file)
    }

    /// Requested kinds in ascending bit order.
    pub fn requested_kinds(&self) -> impl Iterator<Item = &'static AnalysisKind> + '_ {
        let workflow = self.descriptor();
        self.analysis_bitmask
            .iter()
            .filter_map(move |bit| workflow.kind_by_bit(bit))
    }

    /// Frame index to microseconds: `stride * step * 1e-9 * every`.
    ///
    /// `None` when the workflow has no time axis.
    pub fn time_factor(&self) -> Option<f64> {
        let axis = self.descriptor().time_axis?;
        let value = |name: &str| self.param(name).and_then(|v| v.parse::<f64>().ok());
        Some(value(axis.stride)? * value(axis.step)? * 1e-9 * value(axis.every)?)
    }

    /// Full command line for display (`engine arg arg ...`).
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.engine_path.display().to_string()];
        parts.extend(self.positional_args.iter().map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("{arg:?}")
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}
