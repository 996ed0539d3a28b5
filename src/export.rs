//! # QR Code Export
//!
//! Converts a QR payload into a downloadable artifact (SVG, PNG or PDF) and
//! hands it to a file-save collaborator.
//!
//! ## Stages
//!
//! ```text
//! Idle → Rendering → Serializing → RasterizingOrPackaging → Done
//!             └───────────┴──────────────┴──────────────→ Failed
//! ```
//!
//! | Format | Rasterized | Packaged |
//! |--------|------------|----------|
//! | SVG | no | serialized text as-is |
//! | PNG | 1024×1024 canvas by default | PNG encoding |
//! | PDF | 1024×1024 canvas by default | A4 sheet with title, URL, timestamp, instructions |
//!
//! A rendering surface is held for the whole call and released on both the
//! `Done` and `Failed` paths. Failed exports are not retried.
//!
//! ## Example
//!
//! ```
//! use menufacil::design::QrCodeDesign;
//! use menufacil::export::Exporter;
//! use menufacil::model::{ExportFormat, ExportRequest};
//!
//! let exporter = Exporter::new();
//! let artifact = exporter
//!     .export(&ExportRequest {
//!         url: "https://menufacil.app/menu/42".into(),
//!         name: "Table 5".into(),
//!         design: QrCodeDesign::default(),
//!         format: ExportFormat::Svg,
//!     })
//!     .unwrap();
//!
//! assert_eq!(artifact.filename, "table-5.svg");
//! ```

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use crate::design::QrCodeDesign;
use crate::error::{MenuFacilError, Result};
use crate::model::{ExportFormat, ExportRequest};
use crate::render::pdf::QrSheet;
use crate::render::{Renderer, SurfaceRegistry, raster, svg};

/// Default pixel size of exported codes.
pub const EXPORT_SIZE: u32 = 1024;

/// Stem used when a name sanitizes to nothing.
const FALLBACK_STEM: &str = "qr-code";

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Lowercase a display name and collapse whitespace runs into hyphens.
///
/// Punctuation and non-ASCII letters are kept as they are.
///
/// ```
/// use menufacil::export::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My  Café Menu"), "my-café-menu");
/// assert_eq!(sanitize_filename("My Café Menu!!"), "my-café-menu!!");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    WHITESPACE
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}

/// Download filename for an artifact.
pub fn artifact_filename(name: &str, format: ExportFormat) -> String {
    let stem = sanitize_filename(name);
    let stem = if stem.trim_matches('-').is_empty() {
        FALLBACK_STEM
    } else {
        stem.as_str()
    };
    format!("{}.{}", stem, format.extension())
}

// ============================================================================
// ARTIFACTS AND SINKS
// ============================================================================

/// Exported file, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// File-save collaborator.
pub trait ArtifactSink {
    fn save(&self, artifact: &Artifact) -> Result<()>;
}

/// Saves artifacts as files in a directory.
///
/// Path separators in a filename are replaced with `-`, so every artifact
/// lands directly inside the directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where an artifact ends up.
    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.dir.join(local_name(&artifact.filename))
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, artifact: &Artifact) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(artifact);
        if path.parent() != Some(self.dir.as_path()) {
            return Err(MenuFacilError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write {} outside {}", path.display(), self.dir.display()),
            )));
        }
        std::fs::write(&path, &artifact.bytes)?;
        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact saved");
        Ok(())
    }
}

/// A filename reduced to one plain path component.
fn local_name(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '-' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => FALLBACK_STEM.to_string(),
        _ => name,
    }
}

// ============================================================================
// EXPORTER
// ============================================================================

/// Progress of one export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Rendering,
    Serializing,
    RasterizingOrPackaging,
    Done,
    Failed,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportStage::Idle => "idle",
            ExportStage::Rendering => "rendering",
            ExportStage::Serializing => "serializing",
            ExportStage::RasterizingOrPackaging => "rasterizing/packaging",
            ExportStage::Done => "done",
            ExportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks the stage of a single export for logging.
struct ExportRun<'a> {
    name: &'a str,
    format: ExportFormat,
    stage: ExportStage,
}

impl<'a> ExportRun<'a> {
    fn new(request: &'a ExportRequest) -> Self {
        Self {
            name: &request.name,
            format: request.format,
            stage: ExportStage::Idle,
        }
    }

    fn advance(&mut self, next: ExportStage) {
        tracing::debug!(
            name = self.name,
            format = %self.format,
            from = %self.stage,
            to = %next,
            "export stage"
        );
        self.stage = next;
    }

    fn fail(&mut self, error: &MenuFacilError) {
        tracing::warn!(
            name = self.name,
            format = %self.format,
            stage = %self.stage,
            error = %error,
            "export failed"
        );
        self.stage = ExportStage::Failed;
    }
}

/// Runs exports. One instance can serve any number of sequential or
/// concurrent exports; each call checks out its own rendering surface.
#[derive(Debug, Clone)]
pub struct Exporter {
    renderer: Renderer,
    canvas_size: u32,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            renderer: Renderer::default(),
            canvas_size: EXPORT_SIZE,
        }
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surfaces(surfaces: Arc<SurfaceRegistry>) -> Self {
        Self {
            renderer: Renderer::with_surfaces(surfaces),
            ..Self::default()
        }
    }

    /// Pixel size of the rendered code and of the PNG/PDF canvas.
    pub fn with_canvas_size(mut self, size: u32) -> Self {
        self.canvas_size = size;
        self
    }

    pub fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        self.renderer.surfaces()
    }

    /// Export with the current local time on PDF sheets.
    pub fn export(&self, request: &ExportRequest) -> Result<Artifact> {
        self.export_at(request, Local::now().naive_local())
    }

    /// Export with an explicit generation timestamp.
    pub fn export_at(
        &self,
        request: &ExportRequest,
        generated_at: NaiveDateTime,
    ) -> Result<Artifact> {
        let mut run = ExportRun::new(request);
        match self.run_stages(&mut run, request, generated_at) {
            Ok(artifact) => {
                run.advance(ExportStage::Done);
                tracing::info!(
                    filename = %artifact.filename,
                    bytes = artifact.bytes.len(),
                    "export complete"
                );
                Ok(artifact)
            }
            Err(e) => {
                run.fail(&e);
                Err(e)
            }
        }
    }

    /// Export, then hand the artifact to `sink`.
    pub fn export_to(&self, request: &ExportRequest, sink: &dyn ArtifactSink) -> Result<Artifact> {
        let artifact = self.export(request)?;
        sink.save(&artifact)?;
        Ok(artifact)
    }

    pub fn export_png(
        &self,
        url: &str,
        name: &str,
        design: &QrCodeDesign,
        sink: &dyn ArtifactSink,
    ) -> Result<Artifact> {
        self.export_to(&request(url, name, design, ExportFormat::Png), sink)
    }

    pub fn export_svg(
        &self,
        url: &str,
        name: &str,
        design: &QrCodeDesign,
        sink: &dyn ArtifactSink,
    ) -> Result<Artifact> {
        self.export_to(&request(url, name, design, ExportFormat::Svg), sink)
    }

    pub fn export_pdf(
        &self,
        url: &str,
        name: &str,
        design: &QrCodeDesign,
        sink: &dyn ArtifactSink,
    ) -> Result<Artifact> {
        self.export_to(&request(url, name, design, ExportFormat::Pdf), sink)
    }

    /// The surface lives until this returns, whichever way it returns.
    fn run_stages(
        &self,
        run: &mut ExportRun<'_>,
        request: &ExportRequest,
        generated_at: NaiveDateTime,
    ) -> Result<Artifact> {
        let mut surface = self.renderer.surfaces().acquire()?;

        run.advance(ExportStage::Rendering);
        let graphic = self.renderer.render_on(
            &mut surface,
            &request.url,
            self.canvas_size,
            &request.design,
        )?;

        run.advance(ExportStage::Serializing);
        let svg_text = svg::to_svg(&graphic);

        run.advance(ExportStage::RasterizingOrPackaging);
        let bytes = if request.format.needs_raster() {
            let canvas = raster::rasterize(&svg_text, self.canvas_size, graphic.background())?;
            match request.format {
                ExportFormat::Pdf => QrSheet {
                    title: &request.name,
                    url: &request.url,
                    generated_at,
                    image: &canvas,
                }
                .to_pdf()?,
                _ => raster::encode_png(&canvas)?,
            }
        } else {
            svg_text.into_bytes()
        };

        if bytes.is_empty() {
            return Err(MenuFacilError::Encoding(format!(
                "{} export produced no data",
                request.format
            )));
        }

        Ok(Artifact {
            filename: artifact_filename(&request.name, request.format),
            format: request.format,
            bytes,
        })
    }
}

fn request(url: &str, name: &str, design: &QrCodeDesign, format: ExportFormat) -> ExportRequest {
    ExportRequest {
        url: url.to_string(),
        name: name.to_string(),
        design: design.clone(),
        format,
    }
}
