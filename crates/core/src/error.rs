//! Error types for the search core
//!
//! Every fallible operation in the workspace returns [`Result`]. We use
//! `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for search core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the search core
#[derive(Debug, Error)]
pub enum Error {
    /// Entity type is not one of the indexed types
    #[error("Unsupported entity type: {0}")]
    UnsupportedEntity(String),

    /// Change event method is not POST, PUT, PATCH or DELETE
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Domain record (or search document) does not exist
    #[error("Not found: {entity_type}/{entity_id}")]
    NotFound {
        /// Entity type that was looked up
        entity_type: String,
        /// Entity id that was looked up
        entity_id: String,
    },

    /// Backing store I/O or protocol failure
    #[error("Store error: {0}")]
    Store(String),

    /// Query decoded but violates shape
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Change event payload is structurally wrong
    #[error("Invalid change event: {0}")]
    InvalidEvent(String),

    /// Operation was cancelled before its next round-trip
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation deadline passed before its next round-trip
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    /// Index queue is full or no longer accepting work
    #[error("Backpressure: {0}")]
    Backpressure(String),

    /// Configuration file could not be read, parsed or validated
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a store error from anything printable
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    /// Build a not-found error
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Error::NotFound {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Whether replaying the same operation may succeed.
    ///
    /// Cancellation is crash-at-point: every operation is safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::Cancelled | Error::DeadlineExceeded
        )
    }

    /// Whether this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
