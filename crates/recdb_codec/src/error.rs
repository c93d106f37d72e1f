//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// Input was empty.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Bytes were left over after a complete item was decoded.
    #[error("{remaining} trailing bytes after decoded item")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// Payload exceeds the maximum accepted size.
    #[error("payload of {len} bytes exceeds limit of {limit}")]
    PayloadTooLarge {
        /// Actual payload length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}
