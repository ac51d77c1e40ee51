// keys.rs - Key Ids, Key Material, and the Verification Seam

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::graph::SigStatus;

/// Errors related to key id construction
#[derive(Debug, Error)]
pub enum KeyIdError {
    #[error("Invalid key id length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid hex key id: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// An 8-byte key id, the node identity of the trust graph.
///
/// Every id that enters the graph is validated here, at construction;
/// graph operations themselves are total over `KeyId` values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId([u8; 8]);

impl KeyId {
    /// Length of a key id in bytes
    pub const LEN: usize = 8;

    /// Create from exactly 8 raw bytes
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice, rejecting any length other than 8
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyIdError> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| KeyIdError::InvalidLength {
            expected: Self::LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse from a 16-character hex string
    pub fn from_hex(s: &str) -> Result<Self, KeyIdError> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Derive a key id from the trailing 8 bytes of a longer fingerprint,
    /// given as a hex string (whitespace allowed, as printed by key tools).
    ///
    /// Keyservers index keys by the low 64 bits of the fingerprint, so this
    /// is how a root fingerprint becomes the seed id.
    pub fn from_fingerprint_hex(s: &str) -> Result<Self, KeyIdError> {
        let stripped: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(&stripped)?;
        if bytes.len() < Self::LEN {
            return Err(KeyIdError::InvalidLength {
                expected: Self::LEN,
                got: bytes.len(),
            });
        }
        Self::from_slice(&bytes[bytes.len() - Self::LEN..])
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for KeyId {
    type Error = KeyIdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.0))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Parsed public key material handed over by the external PGP collaborator.
///
/// The engine never parses or verifies key packets itself; it only needs
/// the key's id and its user ids for display labels. Everything else stays
/// inside the collaborator's keyring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyMaterial {
    /// The key's 8-byte id
    pub id: KeyId,

    /// User id strings, primary first
    pub user_ids: Vec<String>,
}

impl KeyMaterial {
    /// Create key material from an id and its user ids
    pub fn new(id: KeyId, user_ids: Vec<String>) -> Self {
        Self { id, user_ids }
    }

    /// The primary user id, if the key carries any
    pub fn primary_user_id(&self) -> Option<&str> {
        self.user_ids.first().map(String::as_str)
    }
}

/// One certification signature held by a key, as classified by the
/// external verification capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    /// Id of the key that issued the signature
    pub issuer: KeyId,

    /// Validity classification
    pub status: SigStatus,
}

/// The external verification capability.
///
/// Given key material, reports one `(issuer, status)` pair per
/// certification signature the key holds. Statuses are re-evaluated every
/// time this is called for a subject, so a signature classified
/// [`SigStatus::IssuerUnavailable`] while the issuer's key was missing is
/// upgraded to its true status once the issuer has been imported.
pub trait Verifier: Send + Sync {
    /// Classify every certification signature held by `key`
    fn certifications(&self, key: &KeyMaterial) -> Vec<Certification>;
}
