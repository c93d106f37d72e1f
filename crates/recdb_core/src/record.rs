//! The stored entity and its identifier.

use recdb_codec::{from_cbor, to_cbor, CodecError, CodecResult, Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stored record.
///
/// Identifiers are assigned by an engine at creation time and are:
/// - Strictly increasing within one engine instance
/// - Immutable once assigned
/// - Never reused
///
/// The value `0` is reserved for "not yet assigned".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// The unassigned identifier carried by records before creation.
    pub const UNASSIGNED: Self = Self(0);

    /// Wraps a raw identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true once an engine has assigned this identifier.
    #[inline]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Two-valued record status, encoded as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    /// Encoded as `0`.
    #[default]
    Inactive,
    /// Encoded as `1`.
    Active,
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Inactive => 0,
            Status::Active => 1,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Inactive),
            1 => Ok(Self::Active),
            other => Err(format!("invalid status {other}, expected 0 or 1")),
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Engine-assigned identifier; [`RecordId::UNASSIGNED`] before creation.
    pub id: RecordId,
    /// Free-form name.
    pub name: String,
    /// Record status.
    pub status: Status,
}

impl Record {
    /// Creates an unassigned record ready to be passed to `create`.
    #[must_use]
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            name: name.into(),
            status,
        }
    }

    /// Returns a copy of this record carrying `id`.
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    /// Compares name and status, ignoring the identifier.
    #[must_use]
    pub fn same_content(&self, other: &Record) -> bool {
        self.name == other.name && self.status == other.status
    }
}

impl Encode for Record {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }
}

impl Decode for Record {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let record: Record = from_cbor(bytes)?;
        if !record.id.is_assigned() {
            return Err(CodecError::decoding_failed("record without identifier"));
        }
        Ok(record)
    }
}
