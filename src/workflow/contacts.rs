// src/workflow/contacts.rs

//! Inter-selection contact analysis, optionally with a full distance matrix.

use crate::analysis::{AnalysisKind, FigureTemplate, OutputRole, OutputTemplate, SelectionScope};

use super::{ArgSlot, ParamClass, ParamSpec, RunDir, TimeAxis, Workflow, WorkflowKind};

use SelectionScope::StrictPair;

pub const CONTACTS: u32 = 1;
pub const DISTANCE_MATRIX: u32 = 2;

const KINDS: &[AnalysisKind] = &[
    AnalysisKind {
        id: "contacts",
        label: "Contacts",
        bit: CONTACTS,
        scope: StrictPair,
        outputs: &[
            OutputTemplate::data("timeline", StrictPair),
            OutputTemplate::image("native_contacts", StrictPair, ""),
            OutputTemplate::data("percentage", StrictPair),
            OutputTemplate::data("contacts_length", StrictPair),
            OutputTemplate::data("distbyframe", StrictPair),
            OutputTemplate::data("contacts", StrictPair),
            OutputTemplate::data("distance_length", StrictPair),
        ],
        figures: &[FigureTemplate {
            data: 0,
            image: 1,
            title: "Native contacts between {sel}",
            x_label: "Time (µs)",
            y_label: "Native contacts (%)",
            time_axis: true,
        }],
    },
    AnalysisKind {
        id: "distance_matrix",
        label: "Distance Matrix",
        bit: DISTANCE_MATRIX,
        scope: StrictPair,
        outputs: &[
            OutputTemplate::data("distance_matrix", StrictPair),
            OutputTemplate::new(OutputRole::Image, "distance_matrix", StrictPair, "", "png"),
        ],
        figures: &[FigureTemplate {
            data: 0,
            image: 1,
            title: "Distance matrix {sel}",
            x_label: "Residue",
            y_label: "Residue",
            time_axis: false,
        }],
    },
];

pub static WORKFLOW: Workflow = Workflow {
    kind: WorkflowKind::Contacts,
    description: "contacts between two selections and optional distance matrix",
    output_subdir: "Contacts",
    script: "contacts_distance.tcl",
    log_file: "contacts.log",
    run_in: RunDir::Project,
    selection_spaces: "",
    kinds: KINDS,
    implied_bits: CONTACTS,
    exclusive: &[],
    params: &[
        ParamSpec::new("skip", ParamClass::PositiveInteger, Some("1"), "analyse every n-th frame"),
        ParamSpec::new("cutoff", ParamClass::PositiveNumber, None, "contact cutoff distance (Å)"),
        ParamSpec::new("time_step", ParamClass::PositiveNumber, Some("20"), "integration time step (fs)"),
        ParamSpec::new("frame_stride", ParamClass::PositiveNumber, Some("5000"), "MD steps between saved frames"),
    ],
    flags: &[],
    report: None,
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
        ArgSlot::Param("skip"),
        ArgSlot::Param("cutoff"),
        ArgSlot::OutputDir,
        ArgSlot::BitSwitch(DISTANCE_MATRIX),
        ArgSlot::Reference,
        ArgSlot::ScriptDir,
    ],
};
