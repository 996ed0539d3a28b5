//! # QR Code Store
//!
//! The persistence collaborator. Records live in a hosted database; this
//! crate only needs create, read, delete and scan counting, expressed by the
//! [`QrCodeStore`] trait.
//!
//! ## Implementations
//!
//! | Store | Backing |
//! |-------|---------|
//! | [`MemoryStore`] | in-process map (tests, demos) |
//! | [`SupabaseStore`] | PostgREST `qr_codes` table over HTTPS |
//!
//! Store calls are never retried.

mod memory;
mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{NewQrCode, QrCodeRecord};

/// Errors reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached or failed as a whole
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused this particular request
    #[error("rejected: {0}")]
    Rejected(String),

    /// No record with the requested id
    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Whether the failure concerns the backend rather than one request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Persistence operations on QR code records.
#[async_trait]
pub trait QrCodeStore: Send + Sync {
    async fn create(&self, new: &NewQrCode) -> Result<QrCodeRecord, StoreError>;

    async fn get(&self, id: Uuid) -> Result<QrCodeRecord, StoreError>;

    /// Records of a menu, oldest first.
    async fn list_by_menu(&self, menu_id: Uuid) -> Result<Vec<QrCodeRecord>, StoreError>;

    /// Records of a restaurant, oldest first.
    async fn list_by_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<QrCodeRecord>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Increment the scan counter and return the updated record.
    async fn record_scan(&self, id: Uuid) -> Result<QrCodeRecord, StoreError>;
}
