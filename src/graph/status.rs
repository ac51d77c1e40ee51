// graph/status.rs - Certification Signature Status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validity classification of one certification signature, produced by the
/// external verification capability.
///
/// The numeric codes are the OpenPGP.js certification codes and are stable
/// across the presentation boundary. [`SigStatus::IssuerUnavailable`] is the
/// only value that drives further graph expansion: it marks a signature
/// whose issuer key has not been fetched yet. All other values are terminal
/// with respect to growth, but every value may still change when the
/// subject's certifications are re-verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigStatus {
    /// Cryptographically bad signature
    Bad = 0,

    /// Signature has expired
    Expired = 1,

    /// Issuer key not available yet; verification is pending
    IssuerUnavailable = 2,

    /// Signature was revoked
    Revoked = 3,

    /// Valid signature
    Valid = 4,

    /// Certifying self-signature by the key owner has expired
    OwnerSigExpired = 5,

    /// Certifying self-signature by the key owner was revoked
    OwnerSigRevoked = 6,
}

impl SigStatus {
    /// Convert from the wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SigStatus::Bad),
            1 => Some(SigStatus::Expired),
            2 => Some(SigStatus::IssuerUnavailable),
            3 => Some(SigStatus::Revoked),
            4 => Some(SigStatus::Valid),
            5 => Some(SigStatus::OwnerSigExpired),
            6 => Some(SigStatus::OwnerSigRevoked),
            _ => None,
        }
    }

    /// The wire code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Whether this status means the issuer key is still missing and the
    /// signature awaits re-verification
    pub fn is_pending(&self) -> bool {
        matches!(self, SigStatus::IssuerUnavailable)
    }
}

impl fmt::Display for SigStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SigStatus::Bad => "bad",
            SigStatus::Expired => "expired",
            SigStatus::IssuerUnavailable => "issuer-unavailable",
            SigStatus::Revoked => "revoked",
            SigStatus::Valid => "valid",
            SigStatus::OwnerSigExpired => "owner-sig-expired",
            SigStatus::OwnerSigRevoked => "owner-sig-revoked",
        };
        write!(f, "{name}")
    }
}
