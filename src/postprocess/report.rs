// src/postprocess/report.rs

//! Report assembler boundary.

use std::fmt::Debug;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::errors::PostProcessingError;
use crate::fs::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub heading: String,
    pub image: PathBuf,
}

/// A multi-page document, one image per page. Every `image` exists when the
/// request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub title: String,
    pub output: PathBuf,
    pub pages: Vec<ReportPage>,
}

pub trait ReportAssembler: Send + Sync + Debug {
    fn assemble(&self, request: &ReportRequest) -> Result<(), PostProcessingError>;
}

/// Writes a self-contained HTML page with one page-broken section per image.
#[derive(Debug, Clone)]
pub struct HtmlReportAssembler {
    fs: Arc<dyn FileSystem>,
}

impl HtmlReportAssembler {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn render_html(request: &ReportRequest) -> String {
        let base = request.output.parent();
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
             <style>section {{ page-break-after: always; }} img {{ max-width: 100%; }}</style>\n\
             </head>\n<body>\n<h1>{title}</h1>\n",
            title = escape(&request.title)
        );
        for page in &request.pages {
            let _ = write!(
                html,
                "<section>\n<h2>{}</h2>\n<img src=\"{}\" alt=\"{}\">\n</section>\n",
                escape(&page.heading),
                escape(&relative_src(base, &page.image)),
                escape(&page.heading)
            );
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

impl ReportAssembler for HtmlReportAssembler {
    fn assemble(&self, request: &ReportRequest) -> Result<(), PostProcessingError> {
        let html = Self::render_html(request);
        self.fs
            .write(&request.output, html.as_bytes())
            .map_err(|e| PostProcessingError::ReportFailed {
                path: request.output.clone(),
                message: format!("{e:#}"),
            })
    }
}

/// Runs `program args... --title T --output O [--page HEADING IMAGE]...`.
#[derive(Debug, Clone)]
pub struct CommandReportAssembler {
    program: String,
    args: Vec<String>,
}

impl CommandReportAssembler {
    /// `None` when `command` is empty.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ReportAssembler for CommandReportAssembler {
    fn assemble(&self, request: &ReportRequest) -> Result<(), PostProcessingError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--title")
            .arg(&request.title)
            .arg("--output")
            .arg(&request.output);
        for page in &request.pages {
            cmd.arg("--page").arg(&page.heading).arg(&page.image);
        }

        let failed = |message: String| PostProcessingError::ReportFailed {
            path: request.output.clone(),
            message,
        };
        let output = cmd
            .output()
            .map_err(|e| failed(format!("could not run '{}': {e}", self.program)))?;
        if !output.status.success() {
            return Err(failed(format!(
                "'{}' exited with {}",
                self.program,
                output.status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

fn relative_src(base: Option<&Path>, image: &Path) -> String {
    base.and_then(|base| image.strip_prefix(base).ok())
        .unwrap_or(image)
        .to_string_lossy()
        .into_owned()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
