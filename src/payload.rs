//! # QR Payload Builder
//!
//! Assembles the URL and design of a single QR code from the fields of the
//! editor form. Every field is optional; omitted ones take the editor
//! defaults (black on white, one module of margin).
//!
//! ```
//! use menufacil::payload::{QrPayloadBuilder, menu_url};
//!
//! let payload = QrPayloadBuilder::new("Table 5", menu_url("https://menufacil.app", "42", Some(5)))
//!     .foreground("#1a1a1a")
//!     .margin(2)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(payload.url, "https://menufacil.app/menu/42?table=5");
//! assert_eq!(payload.design.margin, 2);
//! assert_eq!(payload.design.background_color.as_css(), "#ffffff");
//! ```

use serde::{Deserialize, Serialize};

use crate::design::{Color, MAX_MARGIN, QrCodeDesign};
use crate::error::{MenuFacilError, Result};
use crate::model::{ExportFormat, ExportRequest};

/// Margin applied when the form leaves it empty.
pub const DEFAULT_MARGIN: u32 = 1;

/// A QR payload: display name, target URL and design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    pub name: String,
    pub url: String,
    pub design: QrCodeDesign,
}

impl QrPayload {
    pub fn export_request(&self, format: ExportFormat) -> ExportRequest {
        ExportRequest {
            url: self.url.clone(),
            name: self.name.clone(),
            design: self.design.clone(),
            format,
        }
    }
}

/// Raw editor fields, as posted by the UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayloadForm {
    pub name: String,
    pub url: String,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
    pub logo_url: Option<String>,
    pub corner_radius: Option<f32>,
    pub margin: Option<u32>,
}

impl QrPayloadForm {
    pub fn into_payload(self) -> Result<QrPayload> {
        let mut builder = QrPayloadBuilder::new(self.name, self.url);
        if let Some(fg) = self.foreground_color {
            builder = builder.foreground(fg);
        }
        if let Some(bg) = self.background_color {
            builder = builder.background(bg);
        }
        if let Some(logo) = self.logo_url {
            builder = builder.logo(logo);
        }
        if let Some(radius) = self.corner_radius {
            builder = builder.corner_radius(radius);
        }
        if let Some(margin) = self.margin {
            builder = builder.margin(margin);
        }
        builder.build()
    }
}

/// Fluent builder for [`QrPayload`].
///
/// Colors are kept as text until [`build`](Self::build) so a form can be
/// filled field by field and validated once.
#[derive(Debug, Clone)]
pub struct QrPayloadBuilder {
    name: String,
    url: String,
    foreground: Option<String>,
    background: Option<String>,
    logo_url: Option<String>,
    corner_radius: Option<f32>,
    margin: u32,
}

impl QrPayloadBuilder {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            foreground: None,
            background: None,
            logo_url: None,
            corner_radius: None,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn foreground(mut self, color: impl Into<String>) -> Self {
        self.foreground = Some(color.into());
        self
    }

    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Logo URL; blank values are ignored.
    pub fn logo(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.logo_url = (!url.trim().is_empty()).then(|| url.trim().to_string());
        self
    }

    pub fn corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = Some(radius);
        self
    }

    pub fn margin(mut self, modules: u32) -> Self {
        self.margin = modules;
        self
    }

    /// Validate the fields and produce the payload.
    pub fn build(self) -> Result<QrPayload> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(MenuFacilError::InvalidPayload(
                "Name cannot be empty".to_string(),
            ));
        }
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(MenuFacilError::InvalidPayload(
                "URL cannot be empty".to_string(),
            ));
        }

        let foreground_color = parse_or(self.foreground.as_deref(), Color::black)?;
        let background_color = parse_or(self.background.as_deref(), Color::white)?;

        if let Some(radius) = self.corner_radius
            && (!radius.is_finite() || radius < 0.0)
        {
            return Err(MenuFacilError::InvalidPayload(format!(
                "Corner radius must be a non-negative number, got {}",
                radius
            )));
        }

        if self.margin > MAX_MARGIN {
            return Err(MenuFacilError::InvalidPayload(format!(
                "Margin must be at most {} modules, got {}",
                MAX_MARGIN, self.margin
            )));
        }

        Ok(QrPayload {
            name,
            url,
            design: QrCodeDesign {
                foreground_color,
                background_color,
                logo_url: self.logo_url,
                corner_radius: self.corner_radius,
                margin: self.margin,
            },
        })
    }
}

/// Blank strings count as omitted.
fn parse_or(value: Option<&str>, default: fn() -> Color) -> Result<Color> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(css) => Color::parse(css),
        None => Ok(default()),
    }
}

/// Public URL of a menu, optionally pinned to a table.
pub fn menu_url(base: &str, menu_id: &str, table: Option<u32>) -> String {
    let base = base.trim_end_matches('/');
    match table {
        Some(table) => format!("{}/menu/{}?table={}", base, menu_id, table),
        None => format!("{}/menu/{}", base, menu_id),
    }
}
