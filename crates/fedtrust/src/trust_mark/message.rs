//! Verified trust marks as returned by `unpack_trust_mark`.

use serde::{Deserialize, Serialize};

use crate::claims::Claims;
use crate::error::{FederationError, Result};

/// The decoded claims of a signature-checked trust mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMark {
    /// Trust mark issuer.
    pub iss: String,
    /// Entity the mark was issued to.
    pub sub: String,
    /// Trust mark identifier.
    pub id: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// URL of an image representing the mark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    /// URL of human-readable information about the mark.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Delegation token, when the issuer acts on behalf of the mark owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<String>,
    /// Any other claims.
    #[serde(flatten)]
    pub extra: Claims,
}

impl TrustMark {
    /// Build from verified claims.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Verification` if `iss`, `sub`, `id` or
    /// `iat` are missing or mistyped.
    pub fn from_claims(claims: Claims) -> Result<Self> {
        serde_json::from_value(claims.into())
            .map_err(|e| FederationError::Verification(format!("not a trust mark: {e}")))
    }

    /// Check expiry and, when `entity_id` is given, that it issued the mark.
    pub fn verify(&self, now: i64, entity_id: Option<&str>) -> Result<()> {
        if self.is_expired(now) {
            return Err(FederationError::Verification(format!(
                "trust mark {} for {} expired",
                self.id, self.sub
            )));
        }
        if let Some(expected) = entity_id {
            if self.iss != expected {
                return Err(FederationError::IssuerMismatch {
                    expected: expected.to_string(),
                    actual: self.iss.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp < now)
    }
}
