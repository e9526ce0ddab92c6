//! Error types for the call coordination core.

use thiserror::Error;

/// Result type for call-core operations
pub type Result<T> = std::result::Result<T, CallCoreError>;

/// Errors that can occur in the call coordination core
#[derive(Debug, Error)]
pub enum CallCoreError {
    /// The platform refused or failed to launch a call placement.
    ///
    /// Placement is fire-and-forget from this layer's perspective; callers
    /// log this and rely on the call-added callback as the real success
    /// signal.
    #[error("call placement failed: {reason}")]
    PlacementFailed { reason: String },

    /// No in-call service is attached to route the request through.
    #[error("no in-call service attached")]
    ServiceNotAttached,

    /// Internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CallCoreError {
    /// Create a placement failure
    pub fn placement(reason: impl Into<String>) -> Self {
        Self::PlacementFailed {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
