//! # Printable QR Sheet (PDF)
//!
//! Packages a rasterized QR code into a single A4 page together with its
//! title, target URL, generation timestamp and usage instructions.
//!
//! ## Page Layout
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Title (Helvetica-Bold 24)    │  y = 786
//! │ URL                          │  y = 760
//! │ Generated: YYYY-MM-DD HH:MM  │  y = 744
//! │                              │
//! │        ┌──────────┐          │
//! │        │ QR 300pt │          │  y = 420..720
//! │        └──────────┘          │
//! │ 1. ...                       │  y = 380
//! │ 2. ...                       │
//! │ 3. ...                       │
//! │ 4. ...                       │  y = 332
//! └──────────────────────────────┘
//! ```
//!
//! ## Object Layout
//!
//! | # | Object |
//! |---|--------|
//! | 1 | Catalog |
//! | 2 | Pages |
//! | 3 | Page |
//! | 4 | Font `/F1` Helvetica |
//! | 5 | Font `/F2` Helvetica-Bold |
//! | 6 | Image XObject `/Im1` (FlateDecode, DeviceRGB) |
//! | 7 | Content stream (uncompressed) |
//! | 8 | Info |
//!
//! The title and URL are cut to the printable width with a trailing `...`.
//!
//! Output depends only on the inputs: the same sheet with the same
//! timestamp produces identical bytes.

use chrono::NaiveDateTime;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use std::io::Write;

use super::raster::flatten_rgb;
use crate::error::{MenuFacilError, Result};

/// Instruction lines printed under the code.
pub const INSTRUCTIONS: [&str; 4] = [
    "1. Print this page and place the QR code where guests can see it.",
    "2. Guests scan the code with their phone camera.",
    "3. The digital menu opens instantly in their browser.",
    "4. Update your menu online at any time; the QR code stays the same.",
];

/// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const LEFT: f32 = 56.0;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * LEFT;
const QR_SIDE: f32 = 300.0;
const ELLIPSIS: &str = "...";

/// One positioned line of page text.
struct TextLine {
    font: &'static str,
    size: f32,
    y: f32,
    text: String,
}

/// One printable QR sheet.
pub struct QrSheet<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub generated_at: NaiveDateTime,
    pub image: &'a RgbaImage,
}

impl QrSheet<'_> {
    /// Text lines written on the page, top to bottom.
    pub fn text_lines(&self) -> Vec<String> {
        self.layout().into_iter().map(|line| line.text).collect()
    }

    fn layout(&self) -> Vec<TextLine> {
        let mut lines = vec![
            TextLine {
                font: "F2",
                size: 24.0,
                y: 786.0,
                text: fit_width(self.title, 24.0 * BOLD_SCALE),
            },
            TextLine {
                font: "F1",
                size: 10.0,
                y: 760.0,
                text: fit_width(self.url, 10.0),
            },
            TextLine {
                font: "F1",
                size: 10.0,
                y: 744.0,
                text: format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M")),
            },
        ];
        lines.extend(INSTRUCTIONS.iter().enumerate().map(|(i, line)| TextLine {
            font: "F1",
            size: 11.0,
            y: 380.0 - 16.0 * i as f32,
            text: line.to_string(),
        }));
        lines
    }

    /// Encode the sheet as PDF bytes.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let (w, h) = self.image.dimensions();
        let rgb = flatten_rgb(self.image, [255, 255, 255]);
        let image_data = deflate(&rgb)?;

        let mut content = ContentStream::new();
        for line in self.layout() {
            content.text(line.font, line.size, LEFT, line.y, &line.text);
        }
        content.image("Im1", (PAGE_WIDTH - QR_SIDE) / 2.0, 420.0, QR_SIDE, QR_SIDE);
        let content = content.finish();

        let mut pdf = PdfWriter::new();
        pdf.object(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
        pdf.object(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec());
        pdf.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 4 0 R /F2 5 0 R >> /XObject << /Im1 6 0 R >> >> \
                 /Contents 7 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT
            )
            .into_bytes(),
        );
        pdf.object(font_dict("Helvetica"));
        pdf.object(font_dict("Helvetica-Bold"));
        pdf.stream(
            format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>",
                w,
                h,
                image_data.len()
            ),
            &image_data,
        );
        pdf.stream(format!("<< /Length {} >>", content.len()), &content);

        let mut info = b"<< /Title ".to_vec();
        info.extend(literal(self.title));
        info.extend(b" /Producer (menufacil) /CreationDate ");
        info.extend(literal(
            &self.generated_at.format("D:%Y%m%d%H%M%S").to_string(),
        ));
        info.extend(b" >>");
        pdf.object(info);

        Ok(pdf.finish(1, 8))
    }
}

/// Helvetica-Bold runs up to this much wider than Helvetica.
const BOLD_SCALE: f32 = 1.1;

/// Upper bound of a Helvetica glyph advance, in 1/1000 em.
fn glyph_width(c: char) -> u32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ':' | ';' | '!' | ' ' | 'f' | 't' | 'I'
        | '/' | '\\' => 278,
        'r' | '(' | ')' | '-' | '[' | ']' | '`' => 333,
        'm' | 'M' | '@' => 1015,
        'w' | 'W' => 944,
        '%' | '&' => 889,
        'A'..='Z' => 778,
        'a'..='z' | '0'..='9' | '?' | '_' | '#' | '$' | '*' | '+' | '=' | '~' => 584,
        _ => 1015,
    }
}

/// Width of `text` in points at `size`.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(glyph_width).sum::<u32>() as f32 * size / 1000.0
}

/// Cut `text` to the printable width, marking the cut with an ellipsis.
fn fit_width(text: &str, size: f32) -> String {
    if text_width(text, size) <= TEXT_WIDTH {
        return text.to_string();
    }
    let budget = TEXT_WIDTH - text_width(ELLIPSIS, size);
    let mut width = 0.0;
    let mut fitted = String::new();
    for c in text.chars() {
        width += glyph_width(c) as f32 * size / 1000.0;
        if width > budget {
            break;
        }
        fitted.push(c);
    }
    fitted.push_str(ELLIPSIS);
    fitted
}

fn font_dict(base: &str) -> Vec<u8> {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base
    )
    .into_bytes()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let err = |e: std::io::Error| MenuFacilError::Encoding(format!("Failed to compress image: {}", e));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(err)?;
    encoder.finish().map_err(err)
}

// ============================================================================
// CONTENT STREAM
// ============================================================================

struct ContentStream {
    buf: Vec<u8>,
}

impl ContentStream {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, s: &str) {
        self.buf
            .extend(format!("BT /{} {} Tf {} {} Td ", font, size, x, y).into_bytes());
        self.buf.extend(literal(s));
        self.buf.extend(b" Tj ET\n");
    }

    fn image(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        self.buf
            .extend(format!("q {} 0 0 {} {} {} cm /{} Do Q\n", w, h, x, y, name).into_bytes());
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// PDF literal string in WinAnsi encoding.
///
/// Latin-1 characters map to their code point; anything else becomes `?`.
fn literal(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 2);
    out.push(b'(');
    for c in s.chars() {
        let byte = match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        };
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out.push(b')');
    out
}

// ============================================================================
// FILE WRITER
// ============================================================================

/// Sequential object writer with a classic cross-reference table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = b"%PDF-1.4\n".to_vec();
        buf.extend([b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn begin(&mut self) {
        self.offsets.push(self.buf.len());
        self.buf
            .extend(format!("{} 0 obj\n", self.offsets.len()).into_bytes());
    }

    fn object(&mut self, body: Vec<u8>) {
        self.begin();
        self.buf.extend(body);
        self.buf.extend(b"\nendobj\n");
    }

    fn stream(&mut self, dict: String, data: &[u8]) {
        self.begin();
        self.buf.extend(dict.into_bytes());
        self.buf.extend(b"\nstream\n");
        self.buf.extend_from_slice(data);
        self.buf.extend(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;
        self.buf
            .extend(format!("xref\n0 {}\n0000000000 65535 f \n", count).into_bytes());
        for offset in &self.offsets {
            self.buf
                .extend(format!("{:010} 00000 n \n", offset).into_bytes());
        }
        self.buf.extend(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                count, root, info, xref_offset
            )
            .into_bytes(),
        );
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::Rgba;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn sheet_pdf(image: &RgbaImage) -> Vec<u8> {
        QrSheet {
            title: "Table (5)",
            url: "https://menufacil.app/menu/42",
            generated_at: timestamp(),
            image,
        }
        .to_pdf()
        .unwrap()
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_structure() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let pdf = sheet_pdf(&img);
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count(&pdf, b" obj\n"), 8);
        assert_eq!(count(&pdf, b"/Subtype /Image /Width 8 /Height 8"), 1);
    }

    #[test]
    fn test_text_lines() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let pdf = sheet_pdf(&img);
        assert_eq!(count(&pdf, b" Tj ET"), 7);
        assert_eq!(count(&pdf, b"(Table \\(5\\)) Tj"), 1);
        assert_eq!(count(&pdf, b"(Generated: 2024-03-09 18:30) Tj"), 1);
        for line in INSTRUCTIONS {
            assert_eq!(count(&pdf, format!("({}) Tj", line).as_bytes()), 1);
        }
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let pdf = sheet_pdf(&img);
        let text = String::from_utf8_lossy(&pdf);
        let xref = text.rfind("xref\n").unwrap();
        let entries: Vec<usize> = text[xref..]
            .lines()
            .skip(3)
            .take(8)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert_eq!(&pdf[*offset..*offset + expected.len()], expected.as_bytes());
        }
    }

    #[test]
    fn test_deterministic_for_fixed_timestamp() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255]));
        assert_eq!(sheet_pdf(&img), sheet_pdf(&img));
    }

    #[test]
    fn test_literal_encoding() {
        assert_eq!(literal("Café"), b"(Caf\xE9)".to_vec());
        assert_eq!(literal("a\\b"), b"(a\\\\b)".to_vec());
        assert_eq!(literal("🍕"), b"(?)".to_vec());
    }

    #[test]
    fn test_text_lines_listing() {
        let img = RgbaImage::new(1, 1);
        let sheet = QrSheet {
            title: "Bar",
            url: "https://x",
            generated_at: timestamp(),
            image: &img,
        };
        let lines = sheet.text_lines();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2], "Generated: 2024-03-09 18:30");
        assert_eq!(&lines[3..], &INSTRUCTIONS.map(String::from)[..]);

        let pdf = sheet.to_pdf().unwrap();
        for line in &lines {
            let mut shown = literal(line);
            shown.extend(b" Tj ET");
            assert_eq!(count(&pdf, &shown), 1, "{}", line);
        }
    }

    #[test]
    fn test_long_url_cut_to_page_width() {
        let img = RgbaImage::new(1, 1);
        let url = format!("https://menufacil.app/menu/{}", "9".repeat(400));
        let sheet = QrSheet {
            title: "Bar",
            url: &url,
            generated_at: timestamp(),
            image: &img,
        };
        let lines = sheet.text_lines();
        assert!(lines[1].ends_with(ELLIPSIS));
        assert!(lines[1].len() < url.len());
        assert!(url.starts_with(lines[1].trim_end_matches(ELLIPSIS)));
        assert!(text_width(&lines[1], 10.0) <= TEXT_WIDTH);

        let pdf = sheet.to_pdf().unwrap();
        assert_eq!(count(&pdf, url.as_bytes()), 0);
    }

    #[test]
    fn test_long_title_cut_to_page_width() {
        let img = RgbaImage::new(1, 1);
        let title = "Terraza ".repeat(20);
        let sheet = QrSheet {
            title: &title,
            url: "https://x",
            generated_at: timestamp(),
            image: &img,
        };
        let lines = sheet.text_lines();
        assert!(lines[0].ends_with(ELLIPSIS));
        assert!(text_width(&lines[0], 24.0 * BOLD_SCALE) <= TEXT_WIDTH);
        // Short text is untouched
        assert_eq!(lines[1], "https://x");
    }
}
