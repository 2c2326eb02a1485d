#![allow(dead_code)]

//! Fake post-processing collaborators.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use trajrun::errors::PostProcessingError;
use trajrun::postprocess::{PlotRenderer, PlotRequest, ReportAssembler, ReportRequest};

/// Renderer that records every request and writes a placeholder image for
/// each figure.
///
/// Kinds listed in `fail_for` return an error without writing anything;
/// kinds in `panic_for` panic.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    requests: Arc<Mutex<Vec<PlotRequest>>>,
    fail_for: BTreeSet<String>,
    panic_for: BTreeSet<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, kind: &str) -> Self {
        self.fail_for.insert(kind.to_string());
        self
    }

    pub fn panicking_for(mut self, kind: &str) -> Self {
        self.panic_for.insert(kind.to_string());
        self
    }

    pub fn requests(&self) -> Vec<PlotRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.kind).collect()
    }
}

impl PlotRenderer for RecordingRenderer {
    fn render(&self, request: &PlotRequest) -> Result<(), PostProcessingError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.panic_for.contains(&request.kind) {
            panic!("renderer exploded on {}", request.kind);
        }
        if self.fail_for.contains(&request.kind) {
            return Err(PostProcessingError::PlotFailed {
                kind: request.kind.clone(),
                message: "synthetic failure".to_string(),
            });
        }

        for figure in &request.figures {
            std::fs::write(&figure.image, b"PNG").map_err(|e| PostProcessingError::PlotFailed {
                kind: request.kind.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Assembler that records requests and writes the page list to the output.
#[derive(Debug, Clone, Default)]
pub struct RecordingAssembler {
    requests: Arc<Mutex<Vec<ReportRequest>>>,
}

impl RecordingAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReportAssembler for RecordingAssembler {
    fn assemble(&self, request: &ReportRequest) -> Result<(), PostProcessingError> {
        self.requests.lock().unwrap().push(request.clone());
        let pages: Vec<String> = request
            .pages
            .iter()
            .map(|p| p.image.display().to_string())
            .collect();
        std::fs::write(&request.output, pages.join("\n")).map_err(|e| {
            PostProcessingError::ReportFailed {
                path: request.output.clone(),
                message: e.to_string(),
            }
        })
    }
}
