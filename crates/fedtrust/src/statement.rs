//! Entity statements: signed assertions one entity makes about another.

use serde::{Deserialize, Serialize};

use crate::claims::{statement_is_expired, Claims};
use crate::crypto::{JwsSigner, Jwks, KeyJar, TokenSigner};
use crate::error::{FederationError, Result};

/// Decoded claims of a verified entity statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStatement {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Claims>,
    /// Keys the issuer vouches for on behalf of the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<Jwks>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authority_hints: Vec<String>,
    #[serde(flatten)]
    pub extra: Claims,
}

impl EntityStatement {
    /// Build from verified claims.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Verification` if a required claim is
    /// missing or mistyped.
    pub fn from_claims(claims: Claims) -> Result<Self> {
        serde_json::from_value(claims.into())
            .map_err(|e| FederationError::Verification(format!("not an entity statement: {e}")))
    }

    /// A statement an entity makes about itself.
    pub fn is_self_signed(&self) -> bool {
        self.iss == self.sub
    }
}

/// Verify an entity statement token against `keys` and check it has not
/// expired at `now`.
///
/// # Errors
///
/// Returns `FederationError::Verification` for an unknown key, a malformed
/// or expired statement, or `FederationError::SignatureInvalid`.
pub fn verify_entity_statement(token: &str, keys: &KeyJar, now: i64) -> Result<EntityStatement> {
    let claims = JwsSigner::entity_statement().verify(token, keys, None)?;
    if statement_is_expired(&claims, now) {
        return Err(FederationError::Verification(format!(
            "entity statement by {} expired",
            claims.get_str("iss").unwrap_or("unknown issuer")
        )));
    }
    EntityStatement::from_claims(claims)
}
