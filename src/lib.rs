//! # MenúFácil - QR Code Pipeline
//!
//! Generates, exports and manages the QR codes that point guests at a
//! restaurant's digital menu. It provides:
//!
//! - **Payload building**: editor fields → URL + design, with defaults
//! - **Rendering**: URL + design → vector graphic
//! - **Export**: SVG, PNG (1024×1024) and printable PDF sheets
//! - **Batch creation**: one record per entry, with a per-entry report
//! - **HTTP API**: preview, export and record management for the dashboard
//!
//! ## Quick Start
//!
//! ```no_run
//! use menufacil::{
//!     export::{DirectorySink, Exporter},
//!     payload::{QrPayloadBuilder, menu_url},
//! };
//!
//! let payload = QrPayloadBuilder::new("Table 5", menu_url("https://menufacil.app", "42", Some(5)))
//!     .foreground("#1b4332")
//!     .build()?;
//!
//! let exporter = Exporter::new();
//! let sink = DirectorySink::new("qr-codes");
//! exporter.export_pdf(&payload.url, &payload.name, &payload.design, &sink)?;
//!
//! # Ok::<(), menufacil::error::MenuFacilError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`design`] | Colors and QR design parameters |
//! | [`model`] | Records and export requests |
//! | [`payload`] | Payload builder |
//! | [`render`] | Vector rendering, SVG, rasterization, PDF |
//! | [`export`] | Export pipeline and file sinks |
//! | [`batch`] | Batch creation |
//! | [`store`] | Persistence collaborator |
//! | [`server`] | HTTP API |
//! | [`config`] | TOML configuration |
//! | [`error`] | Error types |

pub mod batch;
pub mod config;
pub mod design;
pub mod error;
pub mod export;
pub mod model;
pub mod payload;
pub mod render;
pub mod server;
pub mod store;

// Re-exports for convenience
pub use design::{Color, QrCodeDesign};
pub use error::MenuFacilError;
pub use export::Exporter;
pub use model::{ExportFormat, ExportRequest, QrCodeRecord};
