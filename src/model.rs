//! # Records and Requests
//!
//! Typed shapes exchanged with the persistence collaborator and the
//! exporter. Rows are serialized in snake_case, the column naming of the
//! `qr_codes` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::design::QrCodeDesign;
use crate::error::MenuFacilError;

/// A persisted QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrCodeRecord {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub url: String,
    pub design: QrCodeDesign,
    #[serde(default)]
    pub scan_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCodeRecord {
    /// Export request for this record in the given format.
    pub fn export_request(&self, format: ExportFormat) -> ExportRequest {
        ExportRequest {
            url: self.url.clone(),
            name: self.name.clone(),
            design: self.design.clone(),
            format,
        }
    }
}

/// Input for creating a QR code record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQrCode {
    pub menu_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub url: String,
    pub design: QrCodeDesign,
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Whether the export goes through the raster canvas.
    pub fn needs_raster(&self) -> bool {
        !matches!(self, ExportFormat::Svg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = MenuFacilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(MenuFacilError::InvalidPayload(format!(
                "Unknown export format '{}' (expected png, svg or pdf)",
                other
            ))),
        }
    }
}

/// One user export action. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub design: QrCodeDesign,
    pub format: ExportFormat,
}
