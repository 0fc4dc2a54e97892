//! Ed25519 federation keys and their JWK representation.
//!
//! Keys travel between entities as JSON Web Keys (RFC 7517) using the
//! `OKP` key type for Ed25519 (RFC 8037). A key id is derived from the
//! public key so that the same key always carries the same `kid`.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::crypto::signing::{decode_b64url, encode_b64url};
use crate::error::{FederationError, Result};

/// JWK key type for Edwards-curve keys.
pub const KTY_OKP: &str = "OKP";
/// JWK curve name for Ed25519.
pub const CRV_ED25519: &str = "Ed25519";
/// JWS algorithm name for Ed25519 signatures.
pub const ALG_EDDSA: &str = "EdDSA";

/// Compute the key id for a verifying key.
///
/// Format: base58 of the first 16 bytes of SHA-256(public_key).
pub fn key_id(key: &VerifyingKey) -> String {
    let hash = Sha256::digest(key.as_bytes());
    bs58::encode(&hash[..16]).into_string()
}

/// A single JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Private key component. Only present in private key sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl Jwk {
    /// `true` if this JWK describes an Ed25519 key.
    pub fn is_ed25519(&self) -> bool {
        self.kty == KTY_OKP && self.crv.as_deref() == Some(CRV_ED25519)
    }
}

/// A JSON Web Key Set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `true` if any key in the set carries private material.
    pub fn has_private_keys(&self) -> bool {
        self.keys.iter().any(|k| k.d.is_some())
    }
}

/// An Ed25519 key held by a key jar.
///
/// Public-only keys verify; keys with a signing half can also sign.
#[derive(Clone)]
pub struct FederationKey {
    kid: String,
    verifying_key: VerifyingKey,
    signing_key: Option<SigningKey>,
}

impl FederationKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Self::from_signing_key(signing_key)
    }

    /// Wrap an existing signing key.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            kid: key_id(&verifying_key),
            verifying_key,
            signing_key: Some(signing_key),
        }
    }

    /// Reconstruct a signing key from raw secret bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(bytes))
    }

    /// Wrap a public key. The resulting key can only verify.
    pub fn from_verifying_key(verifying_key: VerifyingKey) -> Self {
        Self {
            kid: key_id(&verifying_key),
            verifying_key,
            signing_key: None,
        }
    }

    /// Import an Ed25519 JWK.
    ///
    /// When the JWK carries `d` the private half is imported too, and must
    /// match `x`. A `kid` present in the JWK is kept as-is.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        if !jwk.is_ed25519() {
            return Err(FederationError::InvalidKey(format!(
                "unsupported key type {} / {}",
                jwk.kty,
                jwk.crv.as_deref().unwrap_or("-")
            )));
        }

        let x = jwk
            .x
            .as_deref()
            .ok_or_else(|| FederationError::InvalidKey("JWK is missing 'x'".into()))?;
        let x_bytes: [u8; 32] = decode_b64url(x)
            .map_err(|e| FederationError::InvalidKey(format!("bad 'x': {e}")))?
            .try_into()
            .map_err(|_| FederationError::InvalidKey("public key must be 32 bytes".into()))?;
        let verifying_key = VerifyingKey::from_bytes(&x_bytes)
            .map_err(|e| FederationError::InvalidKey(format!("invalid verifying key: {e}")))?;

        let mut key = match jwk.d.as_deref() {
            Some(d) => {
                let mut d_bytes = decode_b64url(d)
                    .map_err(|e| FederationError::InvalidKey(format!("bad 'd': {e}")))?;
                let secret: std::result::Result<[u8; 32], _> = d_bytes.as_slice().try_into();
                d_bytes.zeroize();
                let mut secret = secret.map_err(|_| {
                    FederationError::InvalidKey("private key must be 32 bytes".into())
                })?;
                let key = Self::from_signing_key_bytes(&secret);
                secret.zeroize();
                if key.verifying_key != verifying_key {
                    return Err(FederationError::InvalidKey(
                        "private key does not match public key".into(),
                    ));
                }
                key
            }
            None => Self::from_verifying_key(verifying_key),
        };

        if let Some(kid) = &jwk.kid {
            key.kid = kid.clone();
        }
        Ok(key)
    }

    /// The key id.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public half.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// The private half, if this key can sign.
    pub fn signing_key(&self) -> Option<&SigningKey> {
        self.signing_key.as_ref()
    }

    pub fn is_private(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Export the public half as a JWK.
    pub fn to_public_jwk(&self) -> Jwk {
        Jwk {
            kty: KTY_OKP.to_string(),
            crv: Some(CRV_ED25519.to_string()),
            x: Some(encode_b64url(self.verifying_key.as_bytes())),
            d: None,
            kid: Some(self.kid.clone()),
            key_use: Some("sig".to_string()),
            alg: Some(ALG_EDDSA.to_string()),
        }
    }

    /// Export both halves as a JWK. Returns `None` for public-only keys.
    pub fn to_private_jwk(&self) -> Option<Jwk> {
        let signing_key = self.signing_key.as_ref()?;
        let mut secret = signing_key.to_bytes();
        let mut jwk = self.to_public_jwk();
        jwk.d = Some(encode_b64url(&secret));
        secret.zeroize();
        Some(jwk)
    }
}

impl std::fmt::Debug for FederationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationKey")
            .field("kid", &self.kid)
            .field("private", &self.is_private())
            .finish()
    }
}
