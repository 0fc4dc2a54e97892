//! Cryptographic primitives for fedtrust.
//!
//! This module provides:
//! - Ed25519 key handling with JWK import/export
//! - A per-owner key jar for own keys and trust anchor keys
//! - Ed25519 signing and verification with base64url helpers
//! - Compact signed tokens (JWS) behind the `TokenSigner` seam

pub mod keyjar;
pub mod keys;
pub mod signing;
pub mod token;

pub use keyjar::KeyJar;
pub use keys::{FederationKey, Jwk, Jwks};
pub use token::{JwsSigner, TokenSigner};
