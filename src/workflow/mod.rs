// src/workflow/mod.rs

//! Workflow descriptors.
//!
//! The orchestration engine is identical for every workflow; what differs is
//! captured here as static data:
//! - the analysis kinds and their bits,
//! - the positional argument template understood by the engine script,
//! - the parameters and flags accepted from the user,
//! - where outputs and the job log live.
//!
//! Concrete tables live in [`analysis`], [`contacts`], [`secondary`] and
//! [`backmapping`].

use std::fmt;
use std::str::FromStr;

use crate::analysis::{AnalysisKind, OutputTemplate, SelectionScope};

pub mod analysis;
pub mod backmapping;
pub mod contacts;
pub mod secondary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkflowKind {
    Analysis,
    Contacts,
    SecondaryStructure,
    Backmapping,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 4] = [
        WorkflowKind::Analysis,
        WorkflowKind::Contacts,
        WorkflowKind::SecondaryStructure,
        WorkflowKind::Backmapping,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WorkflowKind::Analysis => "analysis",
            WorkflowKind::Contacts => "contacts",
            WorkflowKind::SecondaryStructure => "secondary",
            WorkflowKind::Backmapping => "backmapping",
        }
    }

    pub fn descriptor(self) -> &'static Workflow {
        match self {
            WorkflowKind::Analysis => &analysis::WORKFLOW,
            WorkflowKind::Contacts => &contacts::WORKFLOW,
            WorkflowKind::SecondaryStructure => &secondary::WORKFLOW,
            WorkflowKind::Backmapping => &backmapping::WORKFLOW,
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkflowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "analysis" => Ok(WorkflowKind::Analysis),
            "contacts" => Ok(WorkflowKind::Contacts),
            "secondary" | "ss" => Ok(WorkflowKind::SecondaryStructure),
            "backmapping" | "backmap" => Ok(WorkflowKind::Backmapping),
            other => Err(format!(
                "unknown workflow: {other} (expected analysis, contacts, secondary or backmapping)"
            )),
        }
    }
}

/// Directory the engine process is started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDir {
    /// The user's working directory.
    Project,
    /// The workflow's output sub-directory.
    Output,
}

/// How a raw parameter string is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamClass {
    /// Finite float > 0.
    PositiveNumber,
    /// Integer > 0.
    PositiveInteger,
    /// Any integer (frame bounds such as `-1`).
    Integer,
    /// Non-empty free text.
    Text,
}

impl ParamClass {
    pub fn expected(self) -> &'static str {
        match self {
            ParamClass::PositiveNumber => "a positive number",
            ParamClass::PositiveInteger => "a positive integer",
            ParamClass::Integer => "an integer",
            ParamClass::Text => "non-empty text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub class: ParamClass,
    pub default: Option<&'static str>,
    pub help: &'static str,
}

impl ParamSpec {
    pub const fn new(
        name: &'static str,
        class: ParamClass,
        default: Option<&'static str>,
        help: &'static str,
    ) -> Self {
        Self {
            name,
            class,
            default,
            help,
        }
    }
}

/// Boolean switch. Some flags make the engine write extra files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub outputs: &'static [OutputTemplate],
}

/// Multi-page report assembled after all plots when `flag` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTemplate {
    pub flag: &'static str,
    pub prefix: &'static str,
    pub scope: SelectionScope,
    pub title: &'static str,
}

/// Parameters feeding the frame → microsecond conversion of time axes:
/// `stride * step * 1e-9 * every`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub step: &'static str,
    pub stride: &'static str,
    pub every: &'static str,
}

/// One positional argument of the engine command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSlot {
    /// Configured display/dispatch flags, e.g. `-dispdev text`.
    DispatchArgs,
    /// Configured flag introducing the script, e.g. `-e`.
    ScriptFlag,
    Script,
    /// Configured marker separating engine args from script args, e.g. `-args`.
    ArgsMarker,
    Topology,
    Trajectory,
    Selection(usize),
    Bitmask,
    ScriptDir,
    /// A file next to the engine script.
    SupportFile(&'static str),
    OutputDir,
    /// Output directory joined with a parameter value.
    OutputPath(&'static str),
    /// Reference structure, or `"None"`.
    Reference,
    Param(&'static str),
    /// Parameter value when `bit` is requested, otherwise an empty string.
    ParamIfBit(&'static str, u32),
    /// `"1"` when `bit` is requested, otherwise `"0"`.
    BitSwitch(u32),
    /// `"1"` when the flag is set, otherwise `"0"`.
    FlagSwitch(&'static str),
}

#[derive(Debug)]
pub struct Workflow {
    pub kind: WorkflowKind,
    pub description: &'static str,
    pub output_subdir: &'static str,
    pub script: &'static str,
    pub log_file: &'static str,
    pub run_in: RunDir,
    /// Replacement for whitespace inside selections when the engine script
    /// names its files.
    pub selection_spaces: &'static str,
    pub kinds: &'static [AnalysisKind],
    /// Kinds requested on every run regardless of user choice.
    pub implied_bits: u32,
    /// Pairs of kind ids that may not be requested together.
    pub exclusive: &'static [(&'static str, &'static str)],
    pub params: &'static [ParamSpec],
    pub flags: &'static [FlagSpec],
    pub report: Option<ReportTemplate>,
    pub time_axis: Option<TimeAxis>,
    pub template: &'static [ArgSlot],
}

impl Workflow {
    pub fn kind_by_id(&self, id: &str) -> Option<&'static AnalysisKind> {
        let id = id.trim().to_lowercase();
        self.kinds.iter().find(|k| k.id == id)
    }

    pub fn kind_by_bit(&self, bit: u32) -> Option<&'static AnalysisKind> {
        self.kinds.iter().find(|k| k.bit == bit)
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn flag(&self, name: &str) -> Option<&'static FlagSpec> {
        self.flags.iter().find(|f| f.name == name)
    }
}
