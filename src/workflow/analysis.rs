// src/workflow/analysis.rs

//! Basic and advanced trajectory analyses (RMSD, RMSF, SASA, RDF, ...).

use crate::analysis::{AnalysisKind, FigureTemplate, OutputRole, OutputTemplate, SelectionScope};

use super::{
    ArgSlot, FlagSpec, ParamClass, ParamSpec, ReportTemplate, RunDir, TimeAxis, Workflow,
    WorkflowKind,
};

use SelectionScope::{Pair, Primary, Unscoped};

pub const RMSD: u32 = 1;
pub const RMSF: u32 = 2;
pub const RGYR: u32 = 4;
pub const SASA: u32 = 8;
pub const DISTANCE: u32 = 16;
pub const RDF: u32 = 32;
pub const CONTACT_SURFACE: u32 = 64;

const fn time_figure(title: &'static str, y_label: &'static str) -> FigureTemplate {
    FigureTemplate {
        data: 0,
        image: 1,
        title,
        x_label: "Time (µs)",
        y_label,
        time_axis: true,
    }
}

const KINDS: &[AnalysisKind] = &[
    AnalysisKind {
        id: "rmsd",
        label: "RMSD",
        bit: RMSD,
        scope: Primary,
        outputs: &[
            OutputTemplate::data("RMSD", Primary),
            OutputTemplate::image("RMSD", Primary, ""),
        ],
        figures: &[time_figure("RMSD per Frame - {sel}", "RMSD (Å)")],
    },
    AnalysisKind {
        id: "rmsf",
        label: "RMSF",
        bit: RMSF,
        scope: Primary,
        outputs: &[
            OutputTemplate::data("RMSF", Primary),
            OutputTemplate::image("RMSF", Primary, ""),
        ],
        figures: &[FigureTemplate {
            data: 0,
            image: 1,
            title: "RMSF per Residue - {sel}",
            x_label: "Residue",
            y_label: "RMSF (Å)",
            time_axis: false,
        }],
    },
    AnalysisKind {
        id: "rgyr",
        label: "Radius of Gyration",
        bit: RGYR,
        scope: Primary,
        outputs: &[
            OutputTemplate::data("RGYR", Primary),
            OutputTemplate::image("RGYR", Primary, ""),
        ],
        figures: &[time_figure(
            "Radius of Gyration per Frame - {sel}",
            "Radius of Gyration (Å)",
        )],
    },
    AnalysisKind {
        id: "sasa",
        label: "SASA",
        bit: SASA,
        scope: Pair,
        outputs: &[
            OutputTemplate::data("SASA", Pair),
            OutputTemplate::image("SASA", Pair, ""),
        ],
        figures: &[time_figure("SASA per Frame - {sel}", "SASA (Å²)")],
    },
    AnalysisKind {
        id: "distance",
        label: "Distance",
        bit: DISTANCE,
        scope: Pair,
        outputs: &[
            OutputTemplate::data("distance", Pair),
            OutputTemplate::image("Distance", Pair, ""),
        ],
        figures: &[time_figure("Distance between {sel}", "Distance (Å)")],
    },
    AnalysisKind {
        id: "rdf",
        label: "RDF",
        bit: RDF,
        scope: Pair,
        outputs: &[
            OutputTemplate::data("rdf", Pair),
            OutputTemplate::image("rdf", Pair, "_g"),
            OutputTemplate::image("rdf", Pair, "_integral"),
        ],
        figures: &[
            FigureTemplate {
                data: 0,
                image: 1,
                title: "RDF Analysis - g(r) for {sel}",
                x_label: "r (Å)",
                y_label: "g(r)",
                time_axis: false,
            },
            FigureTemplate {
                data: 0,
                image: 2,
                title: "RDF Analysis - Integral for {sel}",
                x_label: "r (Å)",
                y_label: "Integral g(r)",
                time_axis: false,
            },
        ],
    },
    AnalysisKind {
        id: "contact_surface",
        label: "Contact Surface",
        bit: CONTACT_SURFACE,
        scope: Pair,
        outputs: &[
            OutputTemplate::data("contact_surface", Pair),
            OutputTemplate::image("ContactSurface", Pair, ""),
        ],
        figures: &[time_figure(
            "Contact Surface per Frame - {sel}",
            "Contact surface area (Å²)",
        )],
    },
];

pub static WORKFLOW: Workflow = Workflow {
    kind: WorkflowKind::Analysis,
    description: "RMSD, RMSF, radius of gyration, SASA, distance, RDF and contact surface",
    output_subdir: "Analysis",
    script: "sirah_analysis.tcl",
    log_file: "analysis.log",
    run_in: RunDir::Project,
    selection_spaces: "_",
    kinds: KINDS,
    implied_bits: 0,
    exclusive: &[("sasa", "contact_surface")],
    params: &[
        ParamSpec::new("time_step", ParamClass::PositiveNumber, Some("20"), "integration time step (fs)"),
        ParamSpec::new("frame_stride", ParamClass::PositiveNumber, Some("5000"), "MD steps between saved frames"),
        ParamSpec::new("skip", ParamClass::PositiveInteger, Some("1"), "analyse every n-th frame"),
        ParamSpec::new("solvent_radius", ParamClass::PositiveNumber, Some("2.1"), "SASA probe radius (Å)"),
    ],
    flags: &[
        FlagSpec {
            name: "report",
            help: "assemble a report with every produced plot",
            outputs: &[],
        },
        FlagSpec {
            name: "rmsf_pdb",
            help: "write RMSF into the B-factor column of a PDB",
            outputs: &[OutputTemplate::new(OutputRole::Artifact, "RMSF_protein", Unscoped, "", "pdb")],
        },
    ],
    report: Some(ReportTemplate {
        flag: "report",
        prefix: "Analysis",
        scope: Primary,
        title: "Analysis report - {sel}",
    }),
    time_axis: Some(TimeAxis {
        step: "time_step",
        stride: "frame_stride",
        every: "skip",
    }),
    template: &[
        ArgSlot::DispatchArgs,
        ArgSlot::ScriptFlag,
        ArgSlot::Script,
        ArgSlot::ArgsMarker,
        ArgSlot::Topology,
        ArgSlot::Trajectory,
        ArgSlot::Selection(0),
        ArgSlot::Selection(1),
        ArgSlot::Selection(2),
        ArgSlot::Bitmask,
        ArgSlot::ScriptDir,
        ArgSlot::OutputDir,
        ArgSlot::Reference,
        ArgSlot::Param("skip"),
        ArgSlot::Param("solvent_radius"),
        ArgSlot::FlagSwitch("rmsf_pdb"),
    ],
};
