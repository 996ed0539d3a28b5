//! # Batch Creation Tests
//!
//! Drives the batch coordinator against a scripted store to check ordering,
//! partial failures and backend outages.

use async_trait::async_trait;
use chrono::Utc;
use menufacil::batch::{BatchCoordinator, BatchEntry, EntryOutcome};
use menufacil::design::QrCodeDesign;
use menufacil::error::MenuFacilError;
use menufacil::model::{NewQrCode, QrCodeRecord};
use menufacil::store::{MemoryStore, QrCodeStore, StoreError};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ============================================================================
// SCRIPTED STORE
// ============================================================================

/// How the store answers one create call.
#[derive(Clone)]
enum Reply {
    Ok,
    Reject,
    Down,
}

/// Answers create calls from a script and records the names it was sent.
struct ScriptedStore {
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedStore {
    fn new(script: &[Reply]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.iter().cloned().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QrCodeStore for ScriptedStore {
    async fn create(&self, new: &NewQrCode) -> Result<QrCodeRecord, StoreError> {
        self.calls.lock().unwrap().push(new.name.clone());
        let reply = self.script.lock().unwrap().pop_front().unwrap_or(Reply::Ok);
        match reply {
            Reply::Ok => {
                let now = Utc::now();
                Ok(QrCodeRecord {
                    id: Uuid::new_v4(),
                    menu_id: new.menu_id,
                    restaurant_id: new.restaurant_id,
                    name: new.name.clone(),
                    url: new.url.clone(),
                    design: new.design.clone(),
                    scan_count: 0,
                    created_at: now,
                    updated_at: now,
                })
            }
            Reply::Reject => Err(StoreError::Rejected("duplicate name".into())),
            Reply::Down => Err(StoreError::Unavailable("connection refused".into())),
        }
    }

    async fn get(&self, id: Uuid) -> Result<QrCodeRecord, StoreError> {
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn list_by_menu(&self, _menu_id: Uuid) -> Result<Vec<QrCodeRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn list_by_restaurant(
        &self,
        _restaurant_id: Uuid,
    ) -> Result<Vec<QrCodeRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn record_scan(&self, id: Uuid) -> Result<QrCodeRecord, StoreError> {
        Err(StoreError::NotFound(id.to_string()))
    }
}

fn entry(name: &str) -> BatchEntry {
    BatchEntry {
        name: name.to_string(),
        url: format!("https://menufacil.app/menu/42?table={}", name),
        design: QrCodeDesign::default(),
    }
}

fn entries(names: &[&str]) -> Vec<BatchEntry> {
    names.iter().map(|n| entry(n)).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_three_entries_created_in_order() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = BatchCoordinator::new(store.clone());
    let menu_id = Uuid::new_v4();
    let restaurant_id = Uuid::new_v4();

    let report = coordinator
        .create(menu_id, restaurant_id, entries(&["1", "2", "3"]))
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.summary(), "3 created");
    let names: Vec<_> = report.created().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["1", "2", "3"]);
    assert!(report.created().all(|r| r.menu_id == menu_id));

    let listed = store.list_by_menu(menu_id).await.unwrap();
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn test_backend_down_before_first_create() {
    let store = ScriptedStore::new(&[Reply::Down]);
    let coordinator = BatchCoordinator::new(store.clone());

    let result = coordinator
        .create(Uuid::new_v4(), Uuid::new_v4(), entries(&["A", "B"]))
        .await;

    assert!(matches!(result, Err(MenuFacilError::BatchCreation(_))));
    assert_eq!(store.calls(), vec!["A"]);
}

#[tokio::test]
async fn test_backend_down_mid_batch_keeps_earlier_records() {
    let store = ScriptedStore::new(&[Reply::Ok, Reply::Down]);
    let coordinator = BatchCoordinator::new(store.clone());

    let report = coordinator
        .create(Uuid::new_v4(), Uuid::new_v4(), entries(&["A", "B", "C"]))
        .await
        .unwrap();

    assert_eq!(report.created_count(), 1);
    assert_eq!(report.not_attempted_count(), 2);
    assert_eq!(report.summary(), "1 created, 2 not attempted");
    assert!(matches!(
        &report.outcomes[2],
        EntryOutcome::NotAttempted { name } if name == "C"
    ));
    // Nothing is sent after the outage
    assert_eq!(store.calls(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_rejected_entry_does_not_stop_batch() {
    let store = ScriptedStore::new(&[Reply::Ok, Reply::Reject, Reply::Ok]);
    let coordinator = BatchCoordinator::new(store.clone());

    let report = coordinator
        .create(Uuid::new_v4(), Uuid::new_v4(), entries(&["A", "B", "C"]))
        .await
        .unwrap();

    assert_eq!(report.summary(), "2 created, 1 failed");
    assert!(!report.is_complete());
    assert!(matches!(
        &report.outcomes[1],
        EntryOutcome::Failed { name, .. } if name == "B"
    ));
    assert_eq!(store.calls(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_invalid_entry_sends_nothing() {
    let store = ScriptedStore::new(&[]);
    let coordinator = BatchCoordinator::new(store.clone());

    let mut batch = entries(&["A", "B"]);
    batch[1].url = "   ".into();

    let result = coordinator
        .create(Uuid::new_v4(), Uuid::new_v4(), batch)
        .await;

    assert!(matches!(result, Err(MenuFacilError::BatchCreation(_))));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let coordinator = BatchCoordinator::new(Arc::new(MemoryStore::new()));
    let result = coordinator
        .create(Uuid::new_v4(), Uuid::new_v4(), Vec::new())
        .await;
    assert!(matches!(result, Err(MenuFacilError::BatchCreation(_))));
}

#[tokio::test]
async fn test_names_are_trimmed() {
    let store = ScriptedStore::new(&[]);
    let coordinator = BatchCoordinator::new(store.clone());

    coordinator
        .create(Uuid::new_v4(), Uuid::new_v4(), entries(&["  Patio  "]))
        .await
        .unwrap();

    assert_eq!(store.calls(), vec!["Patio"]);
}
