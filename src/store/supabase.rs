//! PostgREST-backed store (Supabase).
//!
//! Talks to `{base_url}/rest/v1/qr_codes` with the project's API key.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create | `POST /qr_codes` |
//! | get | `GET /qr_codes?id=eq.{id}` |
//! | list_by_menu | `GET /qr_codes?menu_id=eq.{id}&order=created_at.asc` |
//! | list_by_restaurant | `GET /qr_codes?restaurant_id=eq.{id}&order=created_at.asc` |
//! | delete | `DELETE /qr_codes?id=eq.{id}` |
//! | record_scan | `GET` then `PATCH /qr_codes?id=eq.{id}` |
//!
//! Transport errors and 5xx responses map to [`StoreError::Unavailable`],
//! other 4xx responses to [`StoreError::Rejected`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::json;
use uuid::Uuid;

use super::{QrCodeStore, StoreError};
use crate::error::{MenuFacilError, Result};
use crate::model::{NewQrCode, QrCodeRecord};

const TABLE: &str = "qr_codes";

/// Store backed by a Supabase project's REST API.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("menufacil/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MenuFacilError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Send and decode a row list.
    async fn rows(&self, request: RequestBuilder) -> std::result::Result<Vec<QrCodeRecord>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
            return Err(if status.is_server_error() {
                StoreError::Unavailable(detail)
            } else if status == StatusCode::NOT_FOUND {
                StoreError::NotFound(detail)
            } else {
                StoreError::Rejected(detail)
            });
        }

        response
            .json::<Vec<QrCodeRecord>>()
            .await
            .map_err(|e| StoreError::Rejected(format!("unexpected response body: {}", e)))
    }

    async fn list_where(
        &self,
        column: &str,
        id: Uuid,
    ) -> std::result::Result<Vec<QrCodeRecord>, StoreError> {
        let filter = format!("eq.{}", id);
        self.rows(self.request(Method::GET).query(&[
            (column, filter.as_str()),
            ("select", "*"),
            ("order", "created_at.asc"),
        ]))
        .await
    }
}

fn first(rows: Vec<QrCodeRecord>, id: Uuid) -> std::result::Result<QrCodeRecord, StoreError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(format!("QR code {}", id)))
}

#[async_trait]
impl QrCodeStore for SupabaseStore {
    async fn create(&self, new: &NewQrCode) -> std::result::Result<QrCodeRecord, StoreError> {
        tracing::debug!(name = %new.name, menu_id = %new.menu_id, "creating QR code");
        let rows = self
            .rows(
                self.request(Method::POST)
                    .header("Prefer", "return=representation")
                    .json(new),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected("insert returned no rows".to_string()))
    }

    async fn get(&self, id: Uuid) -> std::result::Result<QrCodeRecord, StoreError> {
        let filter = format!("eq.{}", id);
        let rows = self
            .rows(
                self.request(Method::GET)
                    .query(&[("id", filter.as_str()), ("select", "*")]),
            )
            .await?;
        first(rows, id)
    }

    async fn list_by_menu(&self, menu_id: Uuid) -> std::result::Result<Vec<QrCodeRecord>, StoreError> {
        self.list_where("menu_id", menu_id).await
    }

    async fn list_by_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> std::result::Result<Vec<QrCodeRecord>, StoreError> {
        self.list_where("restaurant_id", restaurant_id).await
    }

    async fn delete(&self, id: Uuid) -> std::result::Result<(), StoreError> {
        let filter = format!("eq.{}", id);
        let rows = self
            .rows(
                self.request(Method::DELETE)
                    .header("Prefer", "return=representation")
                    .query(&[("id", filter.as_str())]),
            )
            .await?;
        first(rows, id).map(|_| ())
    }

    /// Read-modify-write; concurrent scans of the same code may be lost.
    async fn record_scan(&self, id: Uuid) -> std::result::Result<QrCodeRecord, StoreError> {
        let current = self.get(id).await?;
        let filter = format!("eq.{}", id);
        let rows = self
            .rows(
                self.request(Method::PATCH)
                    .header("Prefer", "return=representation")
                    .query(&[("id", filter.as_str())])
                    .json(&json!({
                        "scan_count": current.scan_count + 1,
                        "updated_at": Utc::now(),
                    })),
            )
            .await?;
        first(rows, id)
    }
}
