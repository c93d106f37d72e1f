//! # RecDB Codec
//!
//! CBOR encoding/decoding for values that leave the Rust heap.
//!
//! The off-heap engine stores records as opaque byte strings. This crate is
//! the single place where a record becomes bytes and back again:
//! - Encoding goes through `serde` into `ciborium`
//! - Decoding must consume the whole input (no trailing bytes)
//! - Payloads larger than [`MAX_PAYLOAD_LEN`] are refused both ways
//!
//! ## Usage
//!
//! ```
//! use recdb_codec::{from_cbor, to_cbor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Row {
//!     id: u64,
//!     name: String,
//! }
//!
//! let row = Row { id: 7, name: "seven".into() };
//! let bytes = to_cbor(&row).unwrap();
//! let back: Row = from_cbor(&bytes).unwrap();
//! assert_eq!(row, back);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;

pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Maximum encoded size accepted by [`to_cbor`] and [`from_cbor`].
///
/// Records are small; anything near this size is a caller bug.
pub const MAX_PAYLOAD_LEN: usize = 1024 * 1024;

/// Encode a value to CBOR bytes.
///
/// # Errors
///
/// Returns an error if serialization fails or the encoded form is larger
/// than [`MAX_PAYLOAD_LEN`].
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::with_capacity(64);
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;

    if buffer.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLarge {
            len: buffer.len(),
            limit: MAX_PAYLOAD_LEN,
        });
    }
    Ok(buffer)
}

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the input is empty, oversized, not valid CBOR for
/// `T`, or has bytes left after the decoded item.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    if bytes.is_empty() {
        return Err(CodecError::UnexpectedEof);
    }
    if bytes.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLarge {
            len: bytes.len(),
            limit: MAX_PAYLOAD_LEN,
        });
    }

    let mut reader = bytes;
    let value = ciborium::de::from_reader(&mut reader)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.len(),
        });
    }
    Ok(value)
}

/// Trait for types that can be encoded to CBOR.
pub trait Encode {
    /// Encode this value to CBOR bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from CBOR.
pub trait Decode: Sized {
    /// Decode this value from CBOR bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
        status: u8,
    }

    fn row() -> Row {
        Row {
            id: 42,
            name: "answer".into(),
            status: 1,
        }
    }

    #[test]
    fn roundtrip_struct() {
        let bytes = to_cbor(&row()).unwrap();
        let decoded: Row = from_cbor(&bytes).unwrap();
        assert_eq!(decoded, row());
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(to_cbor(&row()).unwrap(), to_cbor(&row()).unwrap());
    }

    #[test]
    fn empty_input_is_eof() {
        let result: CodecResult<Row> = from_cbor(&[]);
        assert_eq!(result, Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = to_cbor(&row()).unwrap();
        bytes.extend_from_slice(&[0x01, 0x02]);

        let result: CodecResult<Row> = from_cbor(&bytes);
        assert_eq!(result, Err(CodecError::TrailingBytes { remaining: 2 }));
    }

    #[test]
    fn wrong_shape_rejected() {
        let bytes = to_cbor(&"just a string").unwrap();
        let result: CodecResult<Row> = from_cbor(&bytes);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn truncated_input_rejected() {
        let bytes = to_cbor(&row()).unwrap();
        let result: CodecResult<Row> = from_cbor(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn oversized_value_rejected() {
        let big = "x".repeat(MAX_PAYLOAD_LEN + 1);
        assert!(matches!(
            to_cbor(&big),
            Err(CodecError::PayloadTooLarge { .. })
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_row_survives(id in any::<u64>(), name in ".{0,64}", status in 0u8..2) {
                let row = Row { id, name, status };
                let bytes = to_cbor(&row).unwrap();
                let decoded: Row = from_cbor(&bytes).unwrap();
                prop_assert_eq!(decoded, row);
            }
        }
    }
}
