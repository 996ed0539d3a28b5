//! HTTP handlers for the server.

pub mod qr;
pub mod records;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::MenuFacilError;
use crate::export::Artifact;
use crate::store::StoreError;

/// Error response carrying a [`MenuFacilError`].
pub struct ApiError(pub MenuFacilError);

impl<E: Into<MenuFacilError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            MenuFacilError::InvalidPayload(_) | MenuFacilError::Render(_) => {
                StatusCode::BAD_REQUEST
            }
            MenuFacilError::BatchCreation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MenuFacilError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            MenuFacilError::Store(StoreError::Rejected(_)) => StatusCode::BAD_REQUEST,
            MenuFacilError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({ "success": false, "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Respond with an artifact as a file download.
pub fn download(artifact: Artifact) -> Response {
    let disposition = content_disposition(&artifact.filename);
    let mut response = (
        [(header::CONTENT_TYPE, artifact.mime_type())],
        artifact.bytes,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987
/// UTF-8 filename.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
