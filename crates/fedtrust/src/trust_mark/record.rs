//! Issued trust mark records — the persisted form of a trust mark.
//!
//! A record is the full claim set that was signed: the mark's template
//! claims plus `id`, `sub`, `iat`, an `exp` when the mark has a lifetime,
//! and whatever extra claims the caller supplied.

use serde::{Deserialize, Serialize};

use crate::claims::Claims;
use crate::error::{FederationError, Result};

/// One issued trust mark as held by an attestation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMarkRecord {
    /// Trust mark identifier.
    pub id: String,
    /// Entity the mark was issued to.
    pub sub: String,
    /// Issuance time (epoch seconds).
    pub iat: i64,
    /// Expiry (epoch seconds), when the mark has a lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// All other claims.
    #[serde(flatten)]
    pub claims: Claims,
}

impl TrustMarkRecord {
    /// Does this record match `subject`, and `issued_at` when given?
    ///
    /// An `issued_at` of zero counts as absent.
    pub fn matches(&self, subject: &str, issued_at: Option<i64>) -> bool {
        self.sub == subject
            && issued_at
                .filter(|t| *t != 0)
                .map_or(true, |iat| self.iat == iat)
    }

    /// The complete claim set of this record.
    pub fn to_claims(&self) -> Result<Claims> {
        let value =
            serde_json::to_value(self).map_err(|e| FederationError::Serialization(e.to_string()))?;
        Claims::try_from(value)
    }

    /// Parse one line of a store file.
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| FederationError::Serialization(e.to_string()))
    }

    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| FederationError::Serialization(e.to_string()))
    }
}

impl TryFrom<Claims> for TrustMarkRecord {
    type Error = FederationError;

    /// Fails with a configuration error when `id`, `sub` or `iat` are
    /// missing or of the wrong type, which can happen when extra claims
    /// overwrite them.
    fn try_from(claims: Claims) -> Result<Self> {
        serde_json::from_value(claims.into()).map_err(|e| {
            FederationError::Configuration(format!("malformed trust mark claims: {e}"))
        })
    }
}
