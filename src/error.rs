//! Error types for the preference inspector.

use thiserror::Error;

/// Main error type for inspector operations.
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device request failed: {0}")]
    Device(String),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("No store selected")]
    NoStoreSelected,

    #[error("Invalid edit path: {0}")]
    InvalidPath(String),

    #[error("Host capability not configured: {0}")]
    CapabilityMissing(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for InspectorError {
    fn from(e: serde_json::Error) -> Self {
        InspectorError::Serialization(e.to_string())
    }
}

/// Result type for inspector operations.
pub type Result<T> = std::result::Result<T, InspectorError>;
