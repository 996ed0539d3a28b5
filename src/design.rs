//! # QR Code Design
//!
//! Visual parameters applied when a QR code is rendered: module and
//! background colors, an optional center logo, rounded modules and the
//! quiet-zone margin.
//!
//! ## Colors
//!
//! [`Color`] accepts the CSS color syntaxes the editor produces:
//!
//! | Syntax | Example |
//! |--------|---------|
//! | short hex | `#fff`, `#fff8` |
//! | long hex | `#1a2b3c`, `#1a2b3c80` |
//! | functional | `rgb(26, 43, 60)`, `rgba(26, 43, 60, 0.5)` |
//! | named | `black`, `white`, `transparent`, ... |
//!
//! The original text is kept so it can be written back verbatim (the SVG
//! `style` attribute carries exactly what the user typed).
//!
//! ```
//! use menufacil::design::Color;
//!
//! let c = Color::parse("#fff").unwrap();
//! assert_eq!(c.rgba(), [255, 255, 255, 255]);
//! assert_eq!(c.as_css(), "#fff");
//! assert_eq!(c.to_hex(), "#ffffff");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MenuFacilError, Result};

// ============================================================================
// COLOR
// ============================================================================

/// CSS named colors accepted by [`Color::parse`].
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 128, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("orange", [255, 165, 0, 255]),
    ("purple", [128, 0, 128, 255]),
    ("gray", [128, 128, 128, 255]),
    ("grey", [128, 128, 128, 255]),
    ("navy", [0, 0, 128, 255]),
    ("maroon", [128, 0, 0, 255]),
    ("teal", [0, 128, 128, 255]),
    ("silver", [192, 192, 192, 255]),
    ("lime", [0, 255, 0, 255]),
    ("transparent", [0, 0, 0, 0]),
];

/// A validated CSS color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    css: String,
    rgba: [u8; 4],
}

impl Color {
    /// Parse a CSS color string.
    pub fn parse(input: &str) -> Result<Self> {
        let css = input.trim();
        let rgba = parse_rgba(css).ok_or_else(|| {
            MenuFacilError::InvalidPayload(format!("'{}' is not a valid color", input))
        })?;
        Ok(Self {
            css: css.to_string(),
            rgba,
        })
    }

    /// Opaque black (`#000000`).
    pub fn black() -> Self {
        Self {
            css: "#000000".to_string(),
            rgba: [0, 0, 0, 255],
        }
    }

    /// Opaque white (`#ffffff`).
    pub fn white() -> Self {
        Self {
            css: "#ffffff".to_string(),
            rgba: [255, 255, 255, 255],
        }
    }

    /// The color exactly as it was written.
    pub fn as_css(&self) -> &str {
        &self.css
    }

    /// Red, green, blue, alpha components.
    pub fn rgba(&self) -> [u8; 4] {
        self.rgba
    }

    /// Canonical `#rrggbb` form, alpha dropped.
    pub fn to_hex(&self) -> String {
        let [r, g, b, _] = self.rgba;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Alpha as a 0.0..=1.0 opacity.
    pub fn opacity(&self) -> f32 {
        self.rgba[3] as f32 / 255.0
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.rgba[3] == 255
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)
    }
}

impl TryFrom<String> for Color {
    type Error = MenuFacilError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.css
    }
}

fn parse_rgba(css: &str) -> Option<[u8; 4]> {
    if let Some(hex) = css.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = css.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_functional(args);
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgba)| *rgba)
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
        4 => Some([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<[u8; 4]> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let mut rgba = [0u8, 0, 0, 255];
    for (slot, part) in rgba.iter_mut().zip(&parts[..3]) {
        *slot = part.parse::<u8>().ok()?;
    }
    if let Some(alpha) = parts.get(3) {
        let alpha: f32 = alpha.parse().ok()?;
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }
        rgba[3] = (alpha * 255.0).round() as u8;
    }
    Some(rgba)
}

// ============================================================================
// DESIGN
// ============================================================================

/// Widest quiet zone accepted, in modules.
pub const MAX_MARGIN: u32 = 64;

/// Visual design of one QR code.
///
/// Serialized in camelCase, the shape stored in the `design` column of a
/// QR code record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeDesign {
    /// Color of the dark modules
    #[serde(default = "Color::black")]
    pub foreground_color: Color,
    /// Color behind the modules, including the margin
    #[serde(default = "Color::white")]
    pub background_color: Color,
    /// Optional logo drawn at the center of the code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Module corner radius as a fraction of a module (0.0..=0.5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
    /// Quiet zone in modules around the code (at most [`MAX_MARGIN`])
    #[serde(default)]
    pub margin: u32,
}

impl Default for QrCodeDesign {
    /// Black on white, no logo, square modules, no margin.
    fn default() -> Self {
        Self {
            foreground_color: Color::black(),
            background_color: Color::white(),
            logo_url: None,
            corner_radius: None,
            margin: 0,
        }
    }
}

impl QrCodeDesign {
    /// Logo URL, if present and not blank.
    pub fn logo(&self) -> Option<&str> {
        self.logo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Corner radius clamped to a drawable range; `0.0` means square modules.
    pub fn effective_corner_radius(&self) -> f32 {
        self.corner_radius
            .filter(|r| r.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 0.5)
    }
}
