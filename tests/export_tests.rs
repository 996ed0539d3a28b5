//! # Export Pipeline Tests
//!
//! End-to-end checks of the exporter: filenames, format contents,
//! determinism, and release of rendering surfaces on every path.

use chrono::{NaiveDate, NaiveDateTime};
use menufacil::design::{Color, QrCodeDesign};
use menufacil::error::{MenuFacilError, Result};
use menufacil::export::{Artifact, ArtifactSink, DirectorySink, EXPORT_SIZE, Exporter};
use menufacil::model::{ExportFormat, ExportRequest};
use menufacil::render::pdf::INSTRUCTIONS;
use pretty_assertions::assert_eq;
use std::sync::Mutex;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Sink keeping every saved artifact in memory.
#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<Artifact>>,
}

impl RecordingSink {
    fn single(&self) -> Artifact {
        let saved = self.saved.lock().unwrap();
        assert_eq!(saved.len(), 1, "expected exactly one saved artifact");
        saved[0].clone()
    }
}

impl ArtifactSink for RecordingSink {
    fn save(&self, artifact: &Artifact) -> Result<()> {
        self.saved.lock().unwrap().push(artifact.clone());
        Ok(())
    }
}

/// Sink that always fails, like a blocked browser download.
struct FailingSink;

impl ArtifactSink for FailingSink {
    fn save(&self, _artifact: &Artifact) -> Result<()> {
        Err(MenuFacilError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "download blocked",
        )))
    }
}

fn design(fg: &str, bg: &str, margin: u32) -> QrCodeDesign {
    QrCodeDesign {
        foreground_color: Color::parse(fg).unwrap(),
        background_color: Color::parse(bg).unwrap(),
        margin,
        ..Default::default()
    }
}

fn request(name: &str, format: ExportFormat) -> ExportRequest {
    ExportRequest {
        url: "https://menufacil.app/menu/42".to_string(),
        name: name.to_string(),
        design: design("#000", "#fff", 1),
        format,
    }
}

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 31)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

// ============================================================================
// FORMAT TESTS
// ============================================================================

#[test]
fn test_svg_export_scenario() {
    let exporter = Exporter::new();
    let sink = RecordingSink::default();

    exporter
        .export_svg(
            "https://menufacil.app/menu/42",
            "Table 5",
            &design("#000", "#fff", 1),
            &sink,
        )
        .unwrap();

    let artifact = sink.single();
    assert_eq!(artifact.filename, "table-5.svg");
    assert_eq!(artifact.mime_type(), "image/svg+xml");

    let text = String::from_utf8(artifact.bytes).unwrap();
    assert!(text.starts_with("<svg "));
    let root = &text[..text.find('>').unwrap()];
    assert!(
        root.contains(r#"style="background-color: #fff""#),
        "root element: {}",
        root
    );
}

#[test]
fn test_png_export_is_1024_square() {
    let exporter = Exporter::new();
    let sink = RecordingSink::default();
    exporter
        .export_png(
            "https://menufacil.app/menu/42",
            "Table 5",
            &design("#1b4332", "#f1faee", 2),
            &sink,
        )
        .unwrap();

    let artifact = sink.single();
    assert_eq!(artifact.filename, "table-5.png");

    let img = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (EXPORT_SIZE, EXPORT_SIZE));
    // The margin shows the background color
    assert_eq!(img.get_pixel(1, 1).0, [0xf1, 0xfa, 0xee, 255]);
    // Some pixel is foreground
    assert!(img.pixels().any(|p| p.0 == [0x1b, 0x43, 0x32, 255]));
}

#[test]
fn test_pdf_export_contents() {
    let exporter = Exporter::new();
    let artifact = exporter
        .export_at(&request("Terraza Norte", ExportFormat::Pdf), fixed_time())
        .unwrap();

    assert_eq!(artifact.filename, "terraza-norte.pdf");
    assert_eq!(artifact.mime_type(), "application/pdf");

    let pdf = &artifact.bytes;
    assert!(pdf.starts_with(b"%PDF-"));
    assert_eq!(count(pdf, b" Tj ET"), 3 + INSTRUCTIONS.len());
    assert_eq!(count(pdf, b"(Terraza Norte) Tj"), 1);
    assert_eq!(count(pdf, b"(https://menufacil.app/menu/42) Tj"), 1);
    assert_eq!(count(pdf, b"(Generated: 2025-01-31 12:00) Tj"), 1);
    for line in INSTRUCTIONS {
        assert_eq!(count(pdf, format!("({}) Tj", line).as_bytes()), 1, "{}", line);
    }
    assert_eq!(count(pdf, b"/Width 1024 /Height 1024"), 1);
}

#[test]
fn test_pdf_instruction_count_independent_of_input() {
    let exporter = Exporter::new();
    let long_url = format!("https://menufacil.app/menu/{}", "9".repeat(400));
    let artifact = exporter
        .export_at(
            &ExportRequest {
                url: long_url,
                name: "X".into(),
                design: QrCodeDesign::default(),
                format: ExportFormat::Pdf,
            },
            fixed_time(),
        )
        .unwrap();
    for line in INSTRUCTIONS {
        assert_eq!(count(&artifact.bytes, line.as_bytes()), 1);
    }
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_exports_are_deterministic() {
    let exporter = Exporter::new();
    for format in [ExportFormat::Svg, ExportFormat::Png, ExportFormat::Pdf] {
        let req = request("Table 5", format);
        let a = exporter.export_at(&req, fixed_time()).unwrap();
        let b = exporter.export_at(&req, fixed_time()).unwrap();
        assert!(a == b, "{} export differs between runs", format);
    }
}

// ============================================================================
// FILENAMES
// ============================================================================

#[test]
fn test_filename_keeps_punctuation() {
    let exporter = Exporter::new();
    let sink = RecordingSink::default();
    exporter
        .export_png(
            "http://x",
            "My Café Menu!!",
            &QrCodeDesign::default(),
            &sink,
        )
        .unwrap();
    assert_eq!(sink.single().filename, "my-café-menu!!.png");
}

#[test]
fn test_filename_collapses_whitespace_runs() {
    let exporter = Exporter::new();
    let artifact = exporter
        .export(&request("My  Café Menu", ExportFormat::Svg))
        .unwrap();
    assert_eq!(artifact.filename, "my-café-menu.svg");
}

// ============================================================================
// FAILURES AND CLEANUP
// ============================================================================

#[test]
fn test_surfaces_released_after_success() {
    let exporter = Exporter::new();
    for format in [ExportFormat::Svg, ExportFormat::Png, ExportFormat::Pdf] {
        exporter.export(&request("A", format)).unwrap();
        assert_eq!(exporter.surfaces().live(), 0);
    }
}

#[test]
fn test_surfaces_released_after_render_failure() {
    let exporter = Exporter::new();
    let oversized = format!("https://menufacil.app/{}", "x".repeat(4000));
    for format in [ExportFormat::Svg, ExportFormat::Png, ExportFormat::Pdf] {
        let result = exporter.export(&ExportRequest {
            url: oversized.clone(),
            name: "Too long".into(),
            design: QrCodeDesign::default(),
            format,
        });
        assert!(matches!(result, Err(MenuFacilError::Render(_))));
        assert_eq!(exporter.surfaces().live(), 0);
    }
}

#[test]
fn test_save_failure_is_reported() {
    let exporter = Exporter::new();
    let result = exporter.export_to(&request("A", ExportFormat::Svg), &FailingSink);
    assert!(matches!(result, Err(MenuFacilError::Io(_))));
    assert_eq!(exporter.surfaces().live(), 0);
}

#[test]
fn test_directory_sink_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path().join("exports"));
    let exporter = Exporter::new();

    let artifact = exporter
        .export_to(&request("Bar Counter", ExportFormat::Svg), &sink)
        .unwrap();

    let path = dir.path().join("exports").join("bar-counter.svg");
    assert_eq!(sink.path_for(&artifact), path);
    assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
}

#[test]
fn test_directory_sink_stays_inside_directory() {
    let dir = tempfile::tempdir().unwrap();
    let exports = dir.path().join("exports");
    let sink = DirectorySink::new(&exports);
    let exporter = Exporter::new();

    let artifact = exporter
        .export_svg("https://x", "../escape", &QrCodeDesign::default(), &sink)
        .unwrap();

    assert_eq!(artifact.filename, "../escape.svg");
    assert!(!dir.path().join("escape.svg").exists());
    assert_eq!(sink.path_for(&artifact), exports.join("..-escape.svg"));
    assert!(exports.join("..-escape.svg").is_file());
}

#[test]
fn test_directory_sink_accepts_slash_in_name() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());
    let exporter = Exporter::new();

    let artifact = exporter
        .export_png(
            "https://x",
            "Bar/Terraza 2",
            &QrCodeDesign::default(),
            &sink,
        )
        .unwrap();

    assert_eq!(artifact.filename, "bar/terraza-2.png");
    let saved = dir.path().join("bar-terraza-2.png");
    assert_eq!(std::fs::read(saved).unwrap(), artifact.bytes);
}

#[test]
fn test_local_logo_file_is_not_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]))
        .save(&logo)
        .unwrap();

    let design = QrCodeDesign {
        logo_url: Some(logo.display().to_string()),
        ..design("#000", "#fff", 1)
    };
    let exporter = Exporter::new();
    let artifact = exporter
        .export(&ExportRequest {
            url: "https://menufacil.app/menu/42".into(),
            name: "Logo".into(),
            design,
            format: ExportFormat::Png,
        })
        .unwrap();

    let img = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
    let center = EXPORT_SIZE / 2;
    assert_eq!(img.get_pixel(center, center).0, [255, 255, 255, 255]);
    assert!(img.pixels().all(|p| p.0 != [255, 0, 0, 255]));
}

#[test]
fn test_rasterization_failure_releases_surface() {
    // Wider than any canvas the rasterizer can allocate
    let exporter = Exporter::new().with_canvas_size(600_000_000);

    for format in [ExportFormat::Png, ExportFormat::Pdf] {
        let result = exporter.export(&request("Huge", format));
        assert!(
            matches!(result, Err(MenuFacilError::Rasterization(_))),
            "{}: {:?}",
            format,
            result.map(|a| a.filename)
        );
        assert_eq!(exporter.surfaces().live(), 0);
    }

    // SVG never touches the canvas
    let svg = exporter.export(&request("Huge", ExportFormat::Svg)).unwrap();
    assert!(String::from_utf8(svg.bytes).unwrap().contains(r#"width="600000000""#));
    assert_eq!(exporter.surfaces().live(), 0);
}

#[test]
fn test_canvas_size_sets_png_dimensions() {
    let exporter = Exporter::new().with_canvas_size(300);
    let artifact = exporter.export(&request("Small", ExportFormat::Png)).unwrap();
    let img = image::load_from_memory(&artifact.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (300, 300));
}
