//! # Error Types
//!
//! This module defines error types used throughout the menufacil library.
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | `Render` | vector graphic construction |
//! | `Rasterization` | SVG parsing and canvas drawing |
//! | `Encoding` | PNG / PDF encoding |
//! | `BatchCreation` | batch coordinator, whole-batch failures |
//! | `InvalidPayload` | payload builder, color parsing |
//! | `Store` | persistence collaborator |

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for menufacil operations
#[derive(Debug, Error)]
pub enum MenuFacilError {
    /// The QR vector graphic could not be constructed
    #[error("Render error: {0}")]
    Render(String),

    /// The serialized graphic could not be decoded or drawn onto a canvas
    #[error("Rasterization error: {0}")]
    Rasterization(String),

    /// PNG or PDF encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The batch as a whole was rejected; no records were created
    #[error("Batch creation error: {0}")]
    BatchCreation(String),

    /// User-supplied payload fields are invalid
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Persistence collaborator error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MenuFacilError>;
