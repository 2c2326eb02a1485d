use std::path::{Path, PathBuf};
use std::sync::Arc;

use trajrun::config::ConfigFile;
use trajrun::errors::PostProcessingError;
use trajrun::fs::{FileSystem, RealFileSystem};
use trajrun::job::{JobRequest, JobSpec, JobSpecBuilder};
use trajrun::postprocess::{
    DisabledPlotRenderer, HtmlReportAssembler, PostProcessDispatcher, ReportPage, ReportRequest,
};
use trajrun::workflow::WorkflowKind;
use trajrun_test_utils::builders::Project;
use trajrun_test_utils::fakes::{RecordingAssembler, RecordingRenderer};
use trajrun_test_utils::init_tracing;

fn fs() -> Arc<dyn FileSystem> {
    Arc::new(RealFileSystem)
}

fn build(request: &JobRequest) -> JobSpec {
    JobSpecBuilder::new(&ConfigFile::default(), fs())
        .build(request)
        .expect("valid request")
}

fn write_data(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), "0 1.0\n1 2.0\n").unwrap();
    }
}

fn dispatcher(renderer: &RecordingRenderer, assembler: &RecordingAssembler) -> PostProcessDispatcher {
    PostProcessDispatcher::new(fs(), Arc::new(renderer.clone()), Arc::new(assembler.clone()))
}

fn three_kinds(project: &Project) -> JobSpec {
    build(
        &project
            .request(WorkflowKind::Analysis)
            .kind("rmsd")
            .kind("rgyr")
            .kind("sasa")
            .sel(1, "A")
            .sel(2, "B")
            .flag("report")
            .build(),
    )
}

#[test]
fn failure_of_one_kind_does_not_stop_the_others() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RMSD_A.dat", "RGYR_A.dat", "SASA_B_B.dat"]);

    let renderer = RecordingRenderer::new().failing_for("rgyr");
    let assembler = RecordingAssembler::new();
    let report = dispatcher(&renderer, &assembler).dispatch(&three_kinds(&project));

    assert_eq!(renderer.kinds(), vec!["rmsd", "rgyr", "sasa"]);
    assert_eq!(report.plotted, vec!["rmsd", "sasa"]);
    assert_eq!(
        report.failed,
        vec![PostProcessingError::PlotFailed {
            kind: "rgyr".to_string(),
            message: "synthetic failure".to_string(),
        }]
    );
    assert!(!report.is_clean());

    let requests = assembler.requests();
    let pages: Vec<PathBuf> = requests[0].pages.iter().map(|p| p.image.clone()).collect();
    assert_eq!(pages, vec![out.join("RMSD_A.png"), out.join("SASA_B_B.png")]);
    assert_eq!(report.report, Some(out.join("Analysis_A.html")));
}

#[test]
fn report_ignores_images_left_by_an_earlier_run() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RMSD_A.dat", "RGYR_A.dat", "SASA_B_B.dat"]);
    std::fs::write(out.join("RGYR_A.png"), b"old PNG").unwrap();

    let renderer = RecordingRenderer::new().failing_for("rgyr");
    let assembler = RecordingAssembler::new();
    let report = dispatcher(&renderer, &assembler).dispatch(&three_kinds(&project));

    assert_eq!(report.plotted, vec!["rmsd", "sasa"]);
    assert!(matches!(
        report.failed.as_slice(),
        [PostProcessingError::PlotFailed { kind, .. }] if kind == "rgyr"
    ));

    let requests = assembler.requests();
    assert_eq!(requests.len(), 1);
    let pages: Vec<PathBuf> = requests[0].pages.iter().map(|p| p.image.clone()).collect();
    assert_eq!(pages, vec![out.join("RMSD_A.png"), out.join("SASA_B_B.png")]);
    assert_eq!(std::fs::read(out.join("RGYR_A.png")).unwrap(), b"old PNG");
}

#[test]
fn panicking_renderer_is_contained() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RMSD_A.dat", "RGYR_A.dat", "SASA_B_B.dat"]);

    let renderer = RecordingRenderer::new().panicking_for("rmsd");
    let report = dispatcher(&renderer, &RecordingAssembler::new()).dispatch(&three_kinds(&project));

    assert_eq!(report.plotted, vec!["rgyr", "sasa"]);
    assert!(
        matches!(
            report.failed.as_slice(),
            [PostProcessingError::PlotPanicked { kind, message }]
                if kind == "rmsd" && message.contains("renderer exploded")
        ),
        "{:?}",
        report.failed
    );
}

#[test]
fn kinds_without_data_are_skipped() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RGYR_A.dat"]);

    let renderer = RecordingRenderer::new();
    let report = dispatcher(&renderer, &RecordingAssembler::new()).dispatch(&three_kinds(&project));

    assert_eq!(renderer.kinds(), vec!["rgyr"]);
    assert_eq!(report.skipped, vec!["rmsd", "sasa"]);
    assert_eq!(report.warnings().len(), 2);
    assert!(report.warnings()[0].contains("rmsd"));
}

#[test]
fn missing_renderer_still_reports_each_kind() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RMSD_A.dat", "SASA_B_B.dat"]);

    let assembler = RecordingAssembler::new();
    let dispatcher =
        PostProcessDispatcher::new(fs(), Arc::new(DisabledPlotRenderer), Arc::new(assembler.clone()));
    let report = dispatcher.dispatch(&three_kinds(&project));

    assert!(report.plotted.is_empty());
    assert_eq!(report.skipped, vec!["rgyr"]);
    assert_eq!(report.failed.len(), 3, "{:?}", report.failed);
    assert!(matches!(
        &report.failed[0],
        PostProcessingError::RendererUnavailable { kind } if kind == "rmsd"
    ));
    assert!(matches!(
        &report.failed[2],
        PostProcessingError::ReportFailed { message, .. } if message.contains("no images")
    ));
    assert_eq!(report.report, None);
    assert!(assembler.requests().is_empty());
}

#[test]
fn figures_carry_titles_labels_and_time_factor() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RMSD_name_CA.dat", "RMSF_name_CA.dat"]);

    let spec = build(
        &project
            .request(WorkflowKind::Analysis)
            .kind("rmsd")
            .kind("rmsf")
            .sel(1, "name CA")
            .param("skip", "4")
            .build(),
    );
    let renderer = RecordingRenderer::new();
    dispatcher(&renderer, &RecordingAssembler::new()).dispatch(&spec);

    let requests = renderer.requests();
    let rmsd = &requests[0].figures[0];
    assert_eq!(rmsd.data, out.join("RMSD_name_CA.dat"));
    assert_eq!(rmsd.image, out.join("RMSD_name_CA.png"));
    assert_eq!(rmsd.title, "RMSD per Frame - name_CA");
    assert_eq!(rmsd.x_label, "Time (µs)");
    let factor = rmsd.time_factor.unwrap();
    assert!((factor - 5000.0 * 20.0 * 1e-9 * 4.0).abs() < 1e-12);

    let rmsf = &requests[1].figures[0];
    assert_eq!(rmsf.x_label, "Residue");
    assert_eq!(rmsf.time_factor, None);
}

#[test]
fn secondary_structure_figures_use_parameter_names() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::SecondaryStructure);
    write_data(&out, &["custom.mtx", "ss_by_frame.xvg", "ss_by_res.xvg", "psi.mtx", "phi.mtx"]);

    let spec = build(
        &project
            .request(WorkflowKind::SecondaryStructure)
            .kind("ramachandran")
            .sel(1, "protein")
            .param("matrix_out", "custom.mtx")
            .build(),
    );
    let renderer = RecordingRenderer::new();
    let report = dispatcher(&renderer, &RecordingAssembler::new()).dispatch(&spec);

    // Psi/phi matrices have no plots; nothing is skipped for them either.
    assert_eq!(report.plotted, vec!["ss"]);
    assert!(report.is_clean());

    let figures = &renderer.requests()[0].figures;
    let pairs: Vec<(PathBuf, PathBuf)> = figures
        .iter()
        .map(|f| (f.data.clone(), f.image.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (out.join("custom.mtx"), out.join("ss_matrix.png")),
            (out.join("ss_by_frame.xvg"), out.join("ss_by_frame.png")),
            (out.join("ss_by_res.xvg"), out.join("ss_by_res.png")),
        ]
    );
}

#[test]
fn backmapping_has_nothing_to_plot() {
    let project = Project::new();
    let spec = build(&project.request(WorkflowKind::Backmapping).param("outname", "aa").build());
    let renderer = RecordingRenderer::new();
    let report = dispatcher(&renderer, &RecordingAssembler::new()).dispatch(&spec);
    assert!(renderer.requests().is_empty());
    assert!(report.is_clean());
    assert!(report.plotted.is_empty());
}

#[test]
fn html_report_lists_pages_with_relative_images() {
    let request = ReportRequest {
        title: "Analysis report - A&B".to_string(),
        output: PathBuf::from("/p/Analysis/Analysis_A.html"),
        pages: vec![
            ReportPage {
                heading: "RMSD per Frame - A".to_string(),
                image: PathBuf::from("/p/Analysis/RMSD_A.png"),
            },
            ReportPage {
                heading: "g(r) <A>".to_string(),
                image: PathBuf::from("/elsewhere/rdf.png"),
            },
        ],
    };

    let html = HtmlReportAssembler::render_html(&request);
    assert!(html.contains("<title>Analysis report - A&amp;B</title>"));
    assert!(html.contains("<img src=\"RMSD_A.png\""));
    assert!(html.contains("<img src=\"/elsewhere/rdf.png\""));
    assert!(html.contains("<h2>g(r) &lt;A&gt;</h2>"));
    assert_eq!(html.matches("<section>").count(), 2);
    assert!(html.contains("page-break-after: always"));
}

#[test]
fn html_report_is_written_through_the_filesystem() {
    init_tracing();
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    write_data(&out, &["RMSD_A.dat"]);

    let renderer = RecordingRenderer::new();
    let dispatcher = PostProcessDispatcher::new(
        fs(),
        Arc::new(renderer.clone()),
        Arc::new(HtmlReportAssembler::new(fs())),
    );
    let spec = build(
        &project
            .request(WorkflowKind::Analysis)
            .kind("rmsd")
            .sel(1, "A")
            .flag("report")
            .build(),
    );
    let report = dispatcher.dispatch(&spec);

    let path = report.report.expect("report written");
    let html = std::fs::read_to_string(path).unwrap();
    assert!(html.contains("<h1>Analysis report - A</h1>"));
    assert!(html.contains("RMSD_A.png"));
}
