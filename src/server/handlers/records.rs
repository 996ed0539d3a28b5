//! Handlers for persisted QR code records.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use super::qr::run_export;
use super::{ApiError, download};
use crate::batch::{BatchCoordinator, BatchEntry, BatchReport};
use crate::model::{ExportFormat, QrCodeRecord};

use super::super::state::AppState;

/// Request body for batch creation.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub restaurant_id: Uuid,
    pub entries: Vec<BatchEntry>,
}

/// Response body for batch creation.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub message: String,
    pub report: BatchReport,
}

/// Handle GET /api/menus/:menu_id/qr-codes.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(menu_id): Path<Uuid>,
) -> Result<Json<Vec<QrCodeRecord>>, ApiError> {
    Ok(Json(state.store.list_by_menu(menu_id).await?))
}

/// Handle GET /api/restaurants/:restaurant_id/qr-codes.
pub async fn list_for_restaurant(
    State(state): State<Arc<AppState>>,
    Path(restaurant_id): Path<Uuid>,
) -> Result<Json<Vec<QrCodeRecord>>, ApiError> {
    Ok(Json(state.store.list_by_restaurant(restaurant_id).await?))
}

/// Handle POST /api/menus/:menu_id/qr-codes - batch creation.
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Path(menu_id): Path<Uuid>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let report = BatchCoordinator::new(state.store.clone())
        .create(menu_id, request.restaurant_id, request.entries)
        .await?;

    let status = if report.created_count() > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(BatchResponse {
            success: report.is_complete(),
            message: report.summary(),
            report,
        }),
    ))
}

/// Handle DELETE /api/qr-codes/:id.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.store.delete(id).await?;
    tracing::info!(%id, "QR code deleted");
    Ok(Json(json!({ "success": true, "message": "QR code deleted" })))
}

/// Handle GET /api/qr-codes/:id/export/:format.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Path((id, format)): Path<(Uuid, ExportFormat)>,
) -> Result<Response, ApiError> {
    let record = state.store.get(id).await?;
    let artifact = run_export(state.exporter.clone(), record.export_request(format)).await?;
    Ok(download(artifact))
}

/// Handle POST /api/qr-codes/:id/scan.
pub async fn scan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<QrCodeRecord>, ApiError> {
    Ok(Json(state.store.record_scan(id).await?))
}
