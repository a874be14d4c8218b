//! Core identifier types: datasets, allocations, accounts.
//!
//! All three are opaque byte newtypes. Dataset and allocation identifiers
//! are 32-byte values supplied by the curation and staking collaborators;
//! accounts are 20-byte addresses. Everything displays as lowercase hex.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an indexed dataset (opaque 32-byte hash).
///
/// Supplied by the curation collaborator; the engine never interprets the
/// bytes, it only keys `DatasetRecord`s by them.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct DatasetId(pub [u8; 32]);

impl DatasetId {
    /// The zero id. Never a valid dataset.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a DatasetId from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a dataset id from its content manifest (BLAKE3).
    pub fn of_content(manifest: &[u8]) -> Self {
        Self(*blake3::hash(manifest).as_bytes())
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for DatasetId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Identifier of an open allocation (opaque 32-byte value).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AllocationId(pub [u8; 32]);

impl AllocationId {
    /// Create an AllocationId from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for AllocationId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 20-byte account address.
///
/// Used for indexers, keepers, delegation pools, and reward destinations.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Rejected wherever a real beneficiary is required.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an Address from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Derive a deterministic child address from a tag and a parent address
    /// (first 20 bytes of `BLAKE3(tag || parent)`).
    pub fn derive(tag: &str, parent: &Address) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(tag.as_bytes());
        hasher.update(&parent.0);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
