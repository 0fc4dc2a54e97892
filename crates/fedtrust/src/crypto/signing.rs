//! Ed25519 signing and verification.
//!
//! Provides a simple API for signing arbitrary messages and verifying
//! signatures against known public keys, plus the unpadded URL-safe
//! base64 encoding used by compact tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{FederationError, Result};

/// Sign a message with an Ed25519 signing key.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> Result<()> {
    verifying_key
        .verify(message, signature)
        .map_err(|_| FederationError::SignatureInvalid)
}

/// Encode bytes as unpadded URL-safe base64.
pub fn encode_b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded URL-safe base64.
pub fn decode_b64url(s: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| FederationError::Verification(format!("invalid base64url: {e}")))
}

/// Sign a message and return the signature as unpadded URL-safe base64.
pub fn sign_to_base64url(signing_key: &SigningKey, message: &[u8]) -> String {
    encode_b64url(&sign(signing_key, message).to_bytes())
}

/// Verify an unpadded URL-safe base64 signature.
pub fn verify_from_base64url(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<()> {
    let sig_array: [u8; 64] = decode_b64url(signature_b64)?
        .try_into()
        .map_err(|_| FederationError::Verification("signature must be 64 bytes".into()))?;

    let signature = Signature::from_bytes(&sig_array);
    verify(verifying_key, message, &signature)
}
