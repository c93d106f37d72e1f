//! Error types for RecDB engines.

use crate::record::RecordId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by record engines.
///
/// Every variant is a local, recoverable condition. Engines report the
/// precise variant and leave policy (for example treating a missing id on
/// delete as success) to their callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation addressed an identifier that is not stored.
    #[error("record not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: RecordId,
    },

    /// Malformed input or configuration.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was wrong.
        message: String,
    },

    /// Unexpected lower-level failure.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] recdb_codec::CodecError),

    /// The engine cannot perform this operation at all.
    #[error("operation not supported by this engine: {operation}")]
    Unsupported {
        /// Name of the refused operation.
        operation: &'static str,
    },

    /// The engine has been shut down.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(id: RecordId) -> Self {
        Self::NotFound { id }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns true for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
