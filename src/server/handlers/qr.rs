//! Stateless QR handlers: preview and export of unsaved payloads.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiError, download};
use crate::error::MenuFacilError;
use crate::export::Exporter;
use crate::model::ExportRequest;
use crate::payload::QrPayloadForm;
use crate::render::svg;

use super::super::state::AppState;

/// Pixel size of editor previews.
const PREVIEW_SIZE: u32 = 256;

/// Handle POST /api/qr/preview - render the editor form as SVG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(form): Json<QrPayloadForm>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = form.into_payload()?;
    let graphic = state
        .exporter
        .renderer()
        .render(&payload.url, PREVIEW_SIZE, &payload.design)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg::to_svg(&graphic)))
}

/// Handle POST /api/qr/export - export a payload as a file download.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let artifact = run_export(state.exporter.clone(), request).await?;
    Ok(download(artifact))
}

/// Run an export on the blocking pool.
pub(super) async fn run_export(
    exporter: Exporter,
    request: ExportRequest,
) -> Result<crate::export::Artifact, ApiError> {
    tokio::task::spawn_blocking(move || exporter.export(&request))
        .await
        .map_err(|e| MenuFacilError::Encoding(format!("Export task failed: {}", e)))?
        .map_err(ApiError)
}
