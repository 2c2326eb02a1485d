// src/workflow/backmapping.rs

//! Coarse-grained to all-atom backmapping. No selections, no plots.

use crate::analysis::{AnalysisKind, OutputRole, OutputTemplate, SelectionScope};

use super::{ArgSlot, FlagSpec, ParamClass, ParamSpec, RunDir, Workflow, WorkflowKind};

pub const BACKMAP: u32 = 1;

const KINDS: &[AnalysisKind] = &[AnalysisKind {
    id: "backmap",
    label: "Backmapping",
    bit: BACKMAP,
    scope: SelectionScope::Unscoped,
    outputs: &[
        OutputTemplate::param(OutputRole::Artifact, "outname", "pdb"),
        OutputTemplate::param(OutputRole::Artifact, "outname", "prmtop"),
        OutputTemplate::param(OutputRole::Artifact, "outname", "inpcrd"),
    ],
    figures: &[],
}];

pub static WORKFLOW: Workflow = Workflow {
    kind: WorkflowKind::Backmapping,
    description: "rebuild all-atom structures from coarse-grained frames",
    output_subdir: "Backmapping",
    script: "backmapping.tcl",
    log_file: "backmapping.log",
    run_in: RunDir::Output,
    selection_spaces: "_",
    kinds: KINDS,
    implied_bits: BACKMAP,
    exclusive: &[],
    params: &[
        ParamSpec::new("first", ParamClass::Integer, Some("0"), "first frame"),
        ParamSpec::new("last", ParamClass::Integer, Some("-1"), "last frame (-1 for the end)"),
        ParamSpec::new("each", ParamClass::PositiveInteger, Some("100"), "backmap every n-th frame"),
        ParamSpec::new("frames", ParamClass::Text, Some("all"), "explicit frame list or 'all'"),
        ParamSpec::new("outname", ParamClass::Text, None, "output file stem"),
        ParamSpec::new("cutoff", ParamClass::PositiveNumber, Some("12"), "minimisation cutoff (Å)"),
        ParamSpec::new("mpi", ParamClass::PositiveInteger, Some("1"), "MPI ranks for minimisation"),
        ParamSpec::new("maxcyc", ParamClass::PositiveInteger, Some("150"), "maximum minimisation cycles"),
        ParamSpec::new("ncyc", ParamClass::PositiveInteger, Some("100"), "steepest descent cycles"),
    ],
    flags: &[
        FlagSpec {
            name: "nomin",
            help: "skip minimisation",
            outputs: &[],
        },
        FlagSpec {
            name: "cuda",
            help: "minimise on the GPU",
            outputs: &[],
        },
        FlagSpec {
            name: "gbsa",
            help: "use implicit solvent during minimisation",
            outputs: &[],
        },
    ],
    report: None,
    time_axis: None,
    template: &[
        ArgSlot::DispatchArgs,
        ArgSlot::ScriptFlag,
        ArgSlot::Script,
        ArgSlot::ArgsMarker,
        ArgSlot::Topology,
        ArgSlot::Trajectory,
        ArgSlot::SupportFile("sirah_vmdtk.tcl"),
        ArgSlot::Param("first"),
        ArgSlot::Param("last"),
        ArgSlot::Param("each"),
        ArgSlot::Param("frames"),
        ArgSlot::OutputPath("outname"),
        ArgSlot::FlagSwitch("nomin"),
        ArgSlot::FlagSwitch("cuda"),
        ArgSlot::FlagSwitch("gbsa"),
        ArgSlot::Param("cutoff"),
        ArgSlot::Param("mpi"),
        ArgSlot::Param("maxcyc"),
        ArgSlot::Param("ncyc"),
    ],
};
