//! Key jar — the per-owner key store an entity signs and verifies with.
//!
//! Keys are grouped by owner: an entity's own keys live under its entity
//! id, and each trust anchor's public keys are imported under the
//! anchor's id. Verification looks keys up by the token issuer.

use std::collections::BTreeMap;

use super::keys::{FederationKey, Jwks};
use crate::error::{FederationError, Result};

/// Owner-indexed collection of federation keys.
#[derive(Debug, Clone, Default)]
pub struct KeyJar {
    owners: BTreeMap<String, Vec<FederationKey>>,
}

impl KeyJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key jar holding one freshly generated signing key for `owner`.
    pub fn with_generated_key(owner: &str) -> Self {
        let mut jar = Self::new();
        jar.add_key(owner, FederationKey::generate());
        jar
    }

    /// Add a key for `owner`. A key whose `kid` is already present for that
    /// owner is ignored. Returns whether the key was added.
    pub fn add_key(&mut self, owner: &str, key: FederationKey) -> bool {
        let keys = self.owners.entry(owner.to_string()).or_default();
        if keys.iter().any(|k| k.kid() == key.kid()) {
            return false;
        }
        keys.push(key);
        true
    }

    /// Import every Ed25519 key in `jwks` under `owner`.
    ///
    /// Keys of other types are skipped with a warning, and keys already held
    /// for `owner` are left as they are. Returns the number of keys newly
    /// added.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::InvalidKey` if an Ed25519 key is malformed,
    /// or if the set contains no usable key at all.
    pub fn import_jwks(&mut self, jwks: &Jwks, owner: &str) -> Result<usize> {
        let mut usable = 0;
        let mut added = 0;
        for jwk in &jwks.keys {
            if !jwk.is_ed25519() {
                log::warn!(
                    "skipping unsupported {} key {:?} for {owner}",
                    jwk.kty,
                    jwk.kid
                );
                continue;
            }
            usable += 1;
            if self.add_key(owner, FederationKey::from_jwk(jwk)?) {
                added += 1;
            }
        }

        if usable == 0 {
            return Err(FederationError::InvalidKey(format!(
                "no usable Ed25519 key in key set for {owner}"
            )));
        }
        log::debug!("imported {added} new key(s) of {usable} for {owner}");
        Ok(added)
    }

    /// Export the public keys of `owner`. Unknown owners yield an empty set.
    pub fn export_jwks(&self, owner: &str) -> Jwks {
        Jwks {
            keys: self
                .keys_for(owner)
                .iter()
                .map(FederationKey::to_public_jwk)
                .collect(),
        }
    }

    /// Export the private keys of `owner`, for persisting to a key file.
    pub fn export_private_jwks(&self, owner: &str) -> Jwks {
        Jwks {
            keys: self
                .keys_for(owner)
                .iter()
                .filter_map(FederationKey::to_private_jwk)
                .collect(),
        }
    }

    /// All keys held for `owner`.
    pub fn keys_for(&self, owner: &str) -> &[FederationKey] {
        self.owners.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First key of `owner` that can sign.
    pub fn signing_key(&self, owner: &str) -> Option<&FederationKey> {
        self.keys_for(owner).iter().find(|k| k.is_private())
    }

    /// Find a verification key for `owner` by key id.
    pub fn verifying_key(&self, owner: &str, kid: &str) -> Option<&FederationKey> {
        self.keys_for(owner).iter().find(|k| k.kid() == kid)
    }

    pub fn contains_owner(&self, owner: &str) -> bool {
        self.owners.get(owner).is_some_and(|keys| !keys.is_empty())
    }

    /// Owners with at least one key, in sorted order.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners
            .iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(owner, _)| owner.as_str())
    }
}
