//! Compact signed tokens.
//!
//! `TokenSigner` is the seam through which trust marks and entity
//! statements are signed and verified. `JwsSigner` implements it with
//! compact JWS (`header.payload.signature`, unpadded base64url) over
//! Ed25519 (`alg: EdDSA`).
//!
//! Signing stamps `iss` with the signing entity and adds `iat` when the
//! claims do not already carry one. Verification resolves the key by the
//! token's `iss` and the header `kid`.

use serde::{Deserialize, Serialize};

use super::keyjar::KeyJar;
use super::keys::ALG_EDDSA;
use super::signing::{decode_b64url, encode_b64url, sign_to_base64url, verify_from_base64url};
use crate::claims::Claims;
use crate::error::{FederationError, Result};

/// Media type of a trust mark token.
pub const TYP_TRUST_MARK: &str = "trust-mark+jwt";
/// Media type of an entity statement token.
pub const TYP_ENTITY_STATEMENT: &str = "entity-statement+jwt";

/// Produces and checks compact signed tokens.
pub trait TokenSigner {
    /// Sign `claims` as `issuer` with a signing key held for `issuer`.
    fn sign(&self, claims: &Claims, keys: &KeyJar, issuer: &str) -> Result<String>;

    /// Verify `token` against the keys of its issuer and return its claims.
    ///
    /// When `expected_issuer` is given, the token's `iss` must equal it.
    fn verify(&self, token: &str, keys: &KeyJar, expected_issuer: Option<&str>)
        -> Result<Claims>;
}

#[derive(Debug, Serialize, Deserialize)]
struct JoseHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

/// Ed25519 compact JWS signer.
#[derive(Debug, Clone)]
pub struct JwsSigner {
    typ: String,
}

impl JwsSigner {
    /// Signer producing tokens with the given `typ` header.
    pub fn new(typ: impl Into<String>) -> Self {
        Self { typ: typ.into() }
    }

    /// Signer for trust marks.
    pub fn trust_mark() -> Self {
        Self::new(TYP_TRUST_MARK)
    }

    /// Signer for entity statements.
    pub fn entity_statement() -> Self {
        Self::new(TYP_ENTITY_STATEMENT)
    }

    pub fn typ(&self) -> &str {
        &self.typ
    }
}

impl Default for JwsSigner {
    fn default() -> Self {
        Self::new("JWT")
    }
}

impl TokenSigner for JwsSigner {
    fn sign(&self, claims: &Claims, keys: &KeyJar, issuer: &str) -> Result<String> {
        let key = keys
            .signing_key(issuer)
            .ok_or_else(|| FederationError::InvalidKey(format!("no signing key for {issuer}")))?;
        // signing_key() only returns keys with a private half
        let signing_key = key
            .signing_key()
            .ok_or_else(|| FederationError::InvalidKey(format!("no signing key for {issuer}")))?;

        let mut payload = claims.clone();
        payload.insert("iss", issuer);
        if !payload.contains("iat") {
            payload.insert("iat", crate::time::now_secs());
        }

        let header = JoseHeader {
            alg: ALG_EDDSA.to_string(),
            typ: Some(self.typ.clone()),
            kid: Some(key.kid().to_string()),
        };
        let header_json = serde_json::to_vec(&header)
            .map_err(|e| FederationError::Serialization(e.to_string()))?;
        let payload_json = serde_json::to_vec(payload.as_map())
            .map_err(|e| FederationError::Serialization(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            encode_b64url(&header_json),
            encode_b64url(&payload_json)
        );
        let signature = sign_to_base64url(signing_key, signing_input.as_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    fn verify(
        &self,
        token: &str,
        keys: &KeyJar,
        expected_issuer: Option<&str>,
    ) -> Result<Claims> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => {
                    return Err(FederationError::Verification(
                        "token is not a compact JWS".into(),
                    ))
                }
            };

        let header: JoseHeader = serde_json::from_slice(&decode_b64url(header_b64)?)
            .map_err(|e| FederationError::Verification(format!("bad token header: {e}")))?;
        if header.alg != ALG_EDDSA {
            return Err(FederationError::Verification(format!(
                "unsupported signing algorithm {}",
                header.alg
            )));
        }
        if let Some(typ) = &header.typ {
            if typ != &self.typ {
                return Err(FederationError::Verification(format!(
                    "unexpected token type {typ}, wanted {}",
                    self.typ
                )));
            }
        }

        let payload: Claims = serde_json::from_slice(&decode_b64url(payload_b64)?)
            .map_err(|e| FederationError::Verification(format!("bad token payload: {e}")))?;
        let issuer = payload
            .get_str("iss")
            .ok_or_else(|| FederationError::Verification("token has no 'iss' claim".into()))?;

        let signing_input = format!("{header_b64}.{payload_b64}");
        match header.kid.as_deref() {
            Some(kid) => {
                let key = keys.verifying_key(issuer, kid).ok_or_else(|| {
                    FederationError::Verification(format!("no key {kid} known for {issuer}"))
                })?;
                verify_from_base64url(key.verifying_key(), signing_input.as_bytes(), signature_b64)?;
            }
            None => {
                let candidates = keys.keys_for(issuer);
                if candidates.is_empty() {
                    return Err(FederationError::Verification(format!(
                        "no keys known for {issuer}"
                    )));
                }
                let verified = candidates.iter().any(|k| {
                    verify_from_base64url(k.verifying_key(), signing_input.as_bytes(), signature_b64)
                        .is_ok()
                });
                if !verified {
                    return Err(FederationError::SignatureInvalid);
                }
            }
        }

        if let Some(expected) = expected_issuer {
            if issuer != expected {
                return Err(FederationError::IssuerMismatch {
                    expected: expected.to_string(),
                    actual: issuer.to_string(),
                });
            }
        }

        Ok(payload)
    }
}
