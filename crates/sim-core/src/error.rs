//! Error types for the SIM tracking subsystem.

use thiserror::Error;

/// Result type for sim-core operations
pub type Result<T> = std::result::Result<T, SimCoreError>;

/// Errors that can occur in the SIM tracking subsystem
#[derive(Debug, Error)]
pub enum SimCoreError {
    /// The registry snapshot could not be encoded for persistence.
    #[error("failed to encode SIM snapshot: {0}")]
    SnapshotEncode(#[from] serde_json::Error),

    /// The durable key-value store rejected a write.
    #[error("state store failure: {message}")]
    Store { message: String },
}

impl SimCoreError {
    /// Create a store failure
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}
