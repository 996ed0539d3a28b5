//! In-process store.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{QrCodeStore, StoreError};
use crate::model::{NewQrCode, QrCodeRecord};

/// Keeps records in insertion order behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<QrCodeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn missing(id: Uuid) -> StoreError {
        StoreError::NotFound(format!("QR code {}", id))
    }
}

#[async_trait]
impl QrCodeStore for MemoryStore {
    async fn create(&self, new: &NewQrCode) -> Result<QrCodeRecord, StoreError> {
        if new.name.trim().is_empty() || new.url.trim().is_empty() {
            return Err(StoreError::Rejected(
                "name and url are required".to_string(),
            ));
        }

        let now = Utc::now();
        let record = QrCodeRecord {
            id: Uuid::new_v4(),
            menu_id: new.menu_id,
            restaurant_id: new.restaurant_id,
            name: new.name.clone(),
            url: new.url.clone(),
            design: new.design.clone(),
            scan_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<QrCodeRecord, StoreError> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Self::missing(id))
    }

    async fn list_by_menu(&self, menu_id: Uuid) -> Result<Vec<QrCodeRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.menu_id == menu_id)
            .cloned()
            .collect())
    }

    async fn list_by_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<QrCodeRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(Self::missing(id));
        }
        Ok(())
    }

    async fn record_scan(&self, id: Uuid) -> Result<QrCodeRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::missing(id))?;
        record.scan_count += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
