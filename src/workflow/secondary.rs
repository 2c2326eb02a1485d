// src/workflow/secondary.rs

//! Secondary structure assignment with optional psi/phi matrices.
//!
//! Output names are parameters so users can redirect them; the defaults
//! match what the engine script writes when left alone.

use crate::analysis::{AnalysisKind, FigureTemplate, OutputRole, OutputTemplate, SelectionScope};

use super::{ArgSlot, ParamClass, ParamSpec, RunDir, TimeAxis, Workflow, WorkflowKind};

use SelectionScope::{Primary, Unscoped};

pub const SECONDARY_STRUCTURE: u32 = 1;
pub const RAMACHANDRAN: u32 = 2;

const KINDS: &[AnalysisKind] = &[
    AnalysisKind {
        id: "ss",
        label: "Secondary Structure",
        bit: SECONDARY_STRUCTURE,
        scope: Primary,
        outputs: &[
            OutputTemplate::param(OutputRole::Data, "matrix_out", ""),
            OutputTemplate::param(OutputRole::Data, "by_frame_out", ""),
            OutputTemplate::param(OutputRole::Data, "by_res_out", ""),
            OutputTemplate::param(OutputRole::Data, "global_out", ""),
            OutputTemplate::new(OutputRole::Image, "ss_matrix", Unscoped, "", "png"),
            OutputTemplate::new(OutputRole::Image, "ss_by_frame", Unscoped, "", "png"),
            OutputTemplate::new(OutputRole::Image, "ss_by_res", Unscoped, "", "png"),
        ],
        figures: &[
            FigureTemplate {
                data: 0,
                image: 4,
                title: "Secondary structure matrix - {sel}",
                x_label: "Time (µs)",
                y_label: "Residue",
                time_axis: true,
            },
            FigureTemplate {
                data: 1,
                image: 5,
                title: "Secondary structure by frame - {sel}",
                x_label: "Time (µs)",
                y_label: "Fraction",
                time_axis: true,
            },
            FigureTemplate {
                data: 2,
                image: 6,
                title: "Secondary structure by residue - {sel}",
                x_label: "Residue",
                y_label: "Fraction",
                time_axis: false,
            },
        ],
    },
    AnalysisKind {
        id: "ramachandran",
        label: "Psi/Phi",
        bit: RAMACHANDRAN,
        scope: Primary,
        outputs: &[
            OutputTemplate::param(OutputRole::Data, "psi_out", ""),
            OutputTemplate::param(OutputRole::Data, "phi_out", ""),
        ],
        figures: &[],
    },
];

pub static WORKFLOW: Workflow = Workflow {
    kind: WorkflowKind::SecondaryStructure,
    description: "secondary structure per frame and residue, optional psi/phi matrices",
    output_subdir: "ss_analysis",
    script: "sirah_ss.tcl",
    log_file: "ss_analysis.log",
    run_in: RunDir::Output,
    selection_spaces: "_",
    kinds: KINDS,
    implied_bits: SECONDARY_STRUCTURE,
    exclusive: &[],
    params: &[
        ParamSpec::new("first", ParamClass::Integer, Some("0"), "first frame"),
        ParamSpec::new("last", ParamClass::Integer, Some("-1"), "last frame (-1 for the end)"),
        ParamSpec::new("each", ParamClass::PositiveInteger, Some("1"), "analyse every n-th frame"),
        ParamSpec::new("time_step", ParamClass::PositiveNumber, Some("20"), "integration time step (fs)"),
        ParamSpec::new("frame_stride", ParamClass::PositiveNumber, Some("5000"), "MD steps between saved frames"),
        ParamSpec::new("by_frame_out", ParamClass::Text, Some("ss_by_frame.xvg"), "per-frame output file"),
        ParamSpec::new("by_res_out", ParamClass::Text, Some("ss_by_res.xvg"), "per-residue output file"),
        ParamSpec::new("global_out", ParamClass::Text, Some("ss_global.xvg"), "global output file"),
        ParamSpec::new("matrix_out", ParamClass::Text, Some("ss.mtx"), "matrix output file"),
        ParamSpec::new("psi_out", ParamClass::Text, Some("psi.mtx"), "psi matrix output file"),
        ParamSpec::new("phi_out", ParamClass::Text, Some("phi.mtx"), "phi matrix output file"),
    ],
    flags: &[],
    report: None,
    time_axis: Some(TimeAxis {
        step: "time_step",
        stride: "frame_stride",
        every: "each",
    }),
    template: &[
        ArgSlot::DispatchArgs,
        ArgSlot::ScriptFlag,
        ArgSlot::Script,
        ArgSlot::ArgsMarker,
        ArgSlot::Topology,
        ArgSlot::Trajectory,
        ArgSlot::Param("first"),
        ArgSlot::Param("last"),
        ArgSlot::Selection(0),
        ArgSlot::Param("each"),
        ArgSlot::BitSwitch(RAMACHANDRAN),
        ArgSlot::ScriptDir,
        ArgSlot::OutputDir,
        ArgSlot::Param("by_frame_out"),
        ArgSlot::Param("by_res_out"),
        ArgSlot::Param("global_out"),
        ArgSlot::Param("matrix_out"),
        ArgSlot::ParamIfBit("psi_out", RAMACHANDRAN),
        ArgSlot::ParamIfBit("phi_out", RAMACHANDRAN),
    ],
};
