//! # Batch Creation
//!
//! Creates several QR code records from one user action. Entries are sent to
//! the store one at a time, in order.
//!
//! ## Outcome
//!
//! There is no atomicity: a record created early in the batch stays created
//! even if later entries fail. The [`BatchReport`] says what happened to
//! every entry:
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | `Created` | the store returned the new record |
//! | `Failed` | the store rejected this entry |
//! | `NotAttempted` | the backend became unavailable before this entry |
//!
//! The whole call fails with [`MenuFacilError::BatchCreation`] (and nothing
//! is created) when the entry list is invalid, or when the backend is
//! unavailable before any record was created.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::design::{MAX_MARGIN, QrCodeDesign};
use crate::error::{MenuFacilError, Result};
use crate::model::{NewQrCode, QrCodeRecord};
use crate::store::QrCodeStore;

/// One requested QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub design: QrCodeDesign,
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Created(QrCodeRecord),
    Failed { name: String, error: String },
    NotAttempted { name: String },
}

/// Per-entry results, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchReport {
    /// Created records, in input order.
    pub fn created(&self) -> impl Iterator<Item = &QrCodeRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            EntryOutcome::Created(record) => Some(record),
            _ => None,
        })
    }

    pub fn created_count(&self) -> usize {
        self.created().count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Failed { .. }))
            .count()
    }

    pub fn not_attempted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::NotAttempted { .. }))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.created_count() == self.outcomes.len()
    }

    /// Aggregate message for notifications, e.g. `"3 created"`.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} created", self.created_count());
        let failed = self.failed_count();
        if failed > 0 {
            summary.push_str(&format!(", {} failed", failed));
        }
        let skipped = self.not_attempted_count();
        if skipped > 0 {
            summary.push_str(&format!(", {} not attempted", skipped));
        }
        summary
    }
}

/// Issues one create call per entry against a store.
#[derive(Clone)]
pub struct BatchCoordinator {
    store: Arc<dyn QrCodeStore>,
}

impl BatchCoordinator {
    pub fn new(store: Arc<dyn QrCodeStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        menu_id: Uuid,
        restaurant_id: Uuid,
        entries: Vec<BatchEntry>,
    ) -> Result<BatchReport> {
        validate(&entries)?;
        tracing::info!(%menu_id, entries = entries.len(), "batch creation started");

        let mut outcomes = Vec::with_capacity(entries.len());
        let mut entries = entries.into_iter();

        while let Some(entry) = entries.next() {
            let new = NewQrCode {
                menu_id,
                restaurant_id,
                name: entry.name.trim().to_string(),
                url: entry.url.trim().to_string(),
                design: entry.design,
            };

            match self.store.create(&new).await {
                Ok(record) => {
                    tracing::debug!(id = %record.id, name = %record.name, "QR code created");
                    outcomes.push(EntryOutcome::Created(record));
                }
                Err(e) if e.is_unavailable() => {
                    let created = outcomes
                        .iter()
                        .filter(|o| matches!(o, EntryOutcome::Created(_)))
                        .count();
                    if created == 0 {
                        tracing::warn!(error = %e, "batch aborted, nothing created");
                        return Err(MenuFacilError::BatchCreation(e.to_string()));
                    }

                    tracing::warn!(error = %e, created, "batch interrupted");
                    outcomes.push(EntryOutcome::NotAttempted { name: new.name });
                    outcomes.extend(entries.by_ref().map(|rest| EntryOutcome::NotAttempted {
                        name: rest.name.trim().to_string(),
                    }));
                }
                Err(e) => {
                    tracing::warn!(name = %new.name, error = %e, "QR code rejected");
                    outcomes.push(EntryOutcome::Failed {
                        name: new.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = BatchReport { outcomes };
        tracing::info!(%menu_id, summary = %report.summary(), "batch creation finished");
        Ok(report)
    }
}

/// Reject the whole batch before anything is sent.
fn validate(entries: &[BatchEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(MenuFacilError::BatchCreation(
            "At least one entry is required".to_string(),
        ));
    }
    for (i, entry) in entries.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(MenuFacilError::BatchCreation(format!(
                "Entry {} has an empty name",
                i + 1
            )));
        }
        if entry.url.trim().is_empty() {
            return Err(MenuFacilError::BatchCreation(format!(
                "Entry {} ('{}') has an empty URL",
                i + 1,
                entry.name.trim()
            )));
        }
        if entry.design.margin > MAX_MARGIN {
            return Err(MenuFacilError::BatchCreation(format!(
                "Entry {} ('{}') has a margin above {} modules",
                i + 1,
                entry.name.trim(),
                MAX_MARGIN
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, url: &str) -> BatchEntry {
        BatchEntry {
            name: name.to_string(),
            url: url.to_string(),
            design: QrCodeDesign::default(),
        }
    }

    #[test]
    fn test_validate() {
        assert!(validate(&[]).is_err());
        assert!(validate(&[entry("A", "https://x"), entry(" ", "https://x")]).is_err());
        assert!(validate(&[entry("A", "")]).is_err());
        assert!(validate(&[entry("A", "https://x")]).is_ok());

        let mut wide = entry("A", "https://x");
        wide.design.margin = MAX_MARGIN + 1;
        assert!(validate(&[wide]).is_err());
    }

    #[test]
    fn test_summary() {
        let report = BatchReport {
            outcomes: vec![
                EntryOutcome::Failed {
                    name: "A".into(),
                    error: "rejected".into(),
                },
                EntryOutcome::NotAttempted { name: "B".into() },
            ],
        };
        assert_eq!(report.summary(), "0 created, 1 failed, 1 not attempted");
        assert!(!report.is_complete());
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let json = serde_json::to_value(EntryOutcome::NotAttempted { name: "B".into() }).unwrap();
        assert_eq!(json["status"], "not_attempted");
        assert_eq!(json["name"], "B");
    }
}
