//! Trust mark issuer — creates, records, signs and unpacks trust marks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::message::TrustMark;
use super::record::TrustMarkRecord;
use super::spec::TrustMarkSpec;
use crate::claims::Claims;
use crate::crypto::{JwsSigner, TokenSigner};
use crate::entity::EntityIdentity;
use crate::error::{FederationError, Result};
use crate::storage::{open_store, AttestationStore, StoreConfig};

/// Issuer section of an entity configuration.
///
/// ```json
/// {
///   "trust_mark_specification": {
///     "https://refeds.org/sirtfi": { "ref": "https://refeds.org/sirtfi", "lifetime": 2592000 }
///   },
///   "trust_mark_db": { "backend": "file", "files": { "https://refeds.org/sirtfi": "sirtfi.jsonl" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustMarkIssuerConfig {
    /// Template per trust mark id.
    #[serde(default)]
    pub trust_mark_specification: BTreeMap<String, TrustMarkSpec>,
    /// Where issued marks are recorded. Defaults to memory.
    #[serde(default)]
    pub trust_mark_db: StoreConfig,
}

/// Issues trust marks on behalf of a federation entity.
pub struct TrustMarkIssuer {
    identity: EntityIdentity,
    specs: BTreeMap<String, Claims>,
    lifetimes: BTreeMap<String, u64>,
    store: Box<dyn AttestationStore>,
    signer: Box<dyn TokenSigner>,
}

impl TrustMarkIssuer {
    /// Build an issuer from its configuration, opening the configured store.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` for a malformed mark
    /// specification or store configuration, or `FederationError::Storage`
    /// if a store file cannot be created.
    pub fn new(config: TrustMarkIssuerConfig, identity: EntityIdentity) -> Result<Self> {
        let mark_ids: Vec<String> = config.trust_mark_specification.keys().cloned().collect();
        let store = open_store(&config.trust_mark_db, &mark_ids)?;
        Self::with_store(config.trust_mark_specification, identity, store)
    }

    /// Build an issuer over an already opened store.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` for a malformed mark
    /// specification, or when `store` is not configured for one of the
    /// specified mark ids.
    pub fn with_store(
        specification: BTreeMap<String, TrustMarkSpec>,
        identity: EntityIdentity,
        store: Box<dyn AttestationStore>,
    ) -> Result<Self> {
        let mut specs = BTreeMap::new();
        let mut lifetimes = BTreeMap::new();
        for (mark_id, spec) in specification {
            spec.validate(&mark_id)?;
            if !store.contains(&mark_id) {
                return Err(FederationError::Configuration(format!(
                    "attestation store has no room for trust mark {mark_id}"
                )));
            }
            if let Some(lifetime) = spec.lifetime {
                lifetimes.insert(mark_id.clone(), lifetime);
            }
            specs.insert(mark_id, spec.claims);
        }

        Ok(Self {
            identity,
            specs,
            lifetimes,
            store,
            signer: Box::new(JwsSigner::trust_mark()),
        })
    }

    /// Replace the token signer.
    pub fn with_signer(mut self, signer: Box<dyn TokenSigner>) -> Self {
        self.signer = signer;
        self
    }

    /// Issue trust mark `id` to `sub`.
    ///
    /// The claims are the mark's template, then `iat`, `id` and `sub`, then
    /// `exp` when the mark has a lifetime, then `extra`. Later claims
    /// replace earlier ones. The record is stored before it is signed.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::UnknownTrustMark` if `id` is not
    /// configured (nothing is stored), `FederationError::Configuration` if
    /// `extra` leaves the claims malformed, or the store or signer error.
    pub fn create_trust_mark(&mut self, id: &str, sub: &str, extra: Claims) -> Result<String> {
        let template = self
            .specs
            .get(id)
            .ok_or_else(|| FederationError::UnknownTrustMark(id.to_string()))?;

        let iat = crate::time::now_secs();
        let mut claims = template.clone();
        claims.insert("iat", iat);
        claims.insert("id", id);
        claims.insert("sub", sub);
        if let Some(lifetime) = self.lifetimes.get(id) {
            claims.insert("exp", expiry(iat, *lifetime)?);
        }
        claims.extend(extra);

        let record = TrustMarkRecord::try_from(claims)?;
        self.store.add(&record)?;
        log::debug!("recorded trust mark {} for {} (iat {})", record.id, record.sub, record.iat);

        let payload = record.to_claims()?;
        self.signer
            .sign(&payload, &self.identity.keyjar, &self.identity.entity_id)
            .map_err(|e| {
                log::warn!(
                    "trust mark {} for {} (iat {}) recorded but not signed: {e}",
                    record.id,
                    record.sub,
                    record.iat
                );
                e
            })
    }

    /// Sign `claims` as a trust mark about this entity itself.
    ///
    /// No template, lifetime or store is involved. `sub` defaults to the
    /// issuer's own entity id.
    pub fn self_signed_trust_mark(&self, mut claims: Claims) -> Result<String> {
        if !claims.contains("sub") {
            claims.insert("sub", self.identity.entity_id.as_str());
        }
        self.signer
            .sign(&claims, &self.identity.keyjar, &self.identity.entity_id)
    }

    /// Verify a trust mark token and return its claims.
    ///
    /// The signature is checked against the entity's key jar: its own keys
    /// and those of every imported trust anchor. When `entity_id` is given,
    /// the mark must have been issued by that entity.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Verification` for an unknown key, a
    /// malformed or expired mark, `FederationError::SignatureInvalid` for a
    /// bad signature, or `FederationError::IssuerMismatch`.
    pub fn unpack_trust_mark(&self, token: &str, entity_id: Option<&str>) -> Result<TrustMark> {
        let claims = self.signer.verify(token, &self.identity.keyjar, None)?;
        let mark = TrustMark::from_claims(claims)?;
        mark.verify(crate::time::now_secs(), entity_id)?;
        Ok(mark)
    }

    /// Has trust mark `id` been issued to `sub` (at exactly `issued_at`,
    /// when given)?
    pub fn find(&self, id: &str, sub: &str, issued_at: Option<i64>) -> Result<bool> {
        self.store.find(id, sub, issued_at)
    }

    /// Every issued mark as JSON text.
    pub fn dump_trust_marks(&self) -> Result<String> {
        self.store.dumps()
    }

    /// Load marks previously produced by [`Self::dump_trust_marks`].
    pub fn load_trust_marks(&mut self, text: &str) -> Result<()> {
        self.store.loads(text)
    }

    /// Configured trust mark ids, sorted.
    pub fn trust_mark_ids(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    /// Lifetime of trust mark `id` in seconds, if it has one.
    pub fn lifetime(&self, id: &str) -> Option<u64> {
        self.lifetimes.get(id).copied()
    }

    pub fn entity_id(&self) -> &str {
        &self.identity.entity_id
    }
}

impl std::fmt::Debug for TrustMarkIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustMarkIssuer")
            .field("entity_id", &self.identity.entity_id)
            .field("trust_marks", &self.specs.keys().collect::<Vec<_>>())
            .field("lifetimes", &self.lifetimes)
            .finish_non_exhaustive()
    }
}

fn expiry(iat: i64, lifetime: u64) -> Result<i64> {
    i64::try_from(lifetime)
        .ok()
        .and_then(|l| iat.checked_add(l))
        .ok_or_else(|| FederationError::Configuration(format!("lifetime {lifetime} out of range")))
}
