//! Federation entity — identity, keys, trust anchors and path resolution.
//!
//! A `FederationEntity` owns an entity id and key jar, the set of trust
//! anchors it trusts (their public keys live in the same key jar under
//! each anchor's id), its authority hints and its anchor priority. It
//! resolves peers through a [`Collector`] and the path selector, issues
//! entity statements, and hands its identity to a trust mark issuer.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::claims::Claims;
use crate::collector::{Collector, StatementQuery, StatementSet};
use crate::config::FederationEntityConfig;
use crate::crypto::{JwsSigner, Jwks, KeyJar, TokenSigner};
use crate::error::{FederationError, Result};
use crate::selection::{select, PathBundle, PriorityList, Selection};
use crate::statement::{verify_entity_statement, EntityStatement};
use crate::storage::load_private_jwks;
use crate::trust_mark::{TrustMarkIssuer, TrustMarkIssuerConfig};

/// The identity a component signs and verifies as: an entity id and the
/// key jar holding its keys and its trust anchors' keys.
#[derive(Debug, Clone)]
pub struct EntityIdentity {
    pub entity_id: String,
    pub keyjar: Arc<KeyJar>,
}

impl EntityIdentity {
    pub fn new(entity_id: impl Into<String>, keyjar: Arc<KeyJar>) -> Self {
        Self {
            entity_id: entity_id.into(),
            keyjar,
        }
    }
}

/// A federation entity.
pub struct FederationEntity {
    entity_id: String,
    entity_type: String,
    keyjar: Arc<KeyJar>,
    trust_anchors: BTreeSet<String>,
    authority_hints: Vec<String>,
    default_lifetime: u64,
    priority: PriorityList,
    issuer_config: Option<TrustMarkIssuerConfig>,
    collector: Box<dyn Collector>,
    signer: Box<dyn TokenSigner>,
}

impl FederationEntity {
    /// Build an entity from `config`, signing with the keys `keys` holds for
    /// the entity id.
    ///
    /// Every configured trust anchor's keys are imported into the key jar
    /// under the anchor id. Without an explicit priority, anchors are
    /// preferred in sorted order.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` for an invalid config,
    /// `FederationError::InvalidKey` if `keys` holds no signing key for the
    /// entity or an anchor key set is malformed.
    pub fn new(
        config: FederationEntityConfig,
        mut keys: KeyJar,
        collector: Box<dyn Collector>,
    ) -> Result<Self> {
        config.validate()?;
        if keys.signing_key(&config.entity_id).is_none() {
            return Err(FederationError::InvalidKey(format!(
                "no signing key for {}",
                config.entity_id
            )));
        }

        for (anchor, jwks) in &config.trust_anchors {
            let n = keys.import_jwks(jwks, anchor)?;
            log::debug!("imported {n} key(s) for trust anchor {anchor}");
        }
        let trust_anchors: BTreeSet<String> = config.trust_anchors.keys().cloned().collect();

        let priority = match config.priority {
            Some(order) => {
                for anchor in order.iter().filter(|a| !trust_anchors.contains(*a)) {
                    log::debug!("priority lists {anchor}, which is not a configured trust anchor");
                }
                PriorityList::new(order)
            }
            None => PriorityList::from_anchors(trust_anchors.iter().cloned()),
        };

        log::info!(
            "federation entity {} ({}) with {} trust anchor(s)",
            config.entity_id,
            config.entity_type,
            trust_anchors.len()
        );

        Ok(Self {
            entity_id: config.entity_id,
            entity_type: config.entity_type,
            keyjar: Arc::new(keys),
            trust_anchors,
            authority_hints: config.authority_hints,
            default_lifetime: config.default_lifetime,
            priority,
            issuer_config: config.trust_mark_issuer,
            collector,
            signer: Box::new(JwsSigner::entity_statement()),
        })
    }

    /// Build an entity from a configuration file. Its `key_file` supplies
    /// the signing keys.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` if no `key_file` is set,
    /// plus any error of [`FederationEntityConfig::from_file`],
    /// [`load_private_jwks`] or [`Self::new`].
    pub fn from_config_file(path: &Path, collector: Box<dyn Collector>) -> Result<Self> {
        let config = FederationEntityConfig::from_file(path)?;
        let key_file = config.key_file.as_deref().ok_or_else(|| {
            FederationError::Configuration(format!("{} sets no key_file", path.display()))
        })?;

        let mut keys = KeyJar::new();
        keys.import_jwks(&load_private_jwks(key_file)?, &config.entity_id)?;
        Self::new(config, keys, collector)
    }

    /// Replace the entity statement signer.
    pub fn with_signer(mut self, signer: Box<dyn TokenSigner>) -> Self {
        self.signer = signer;
        self
    }

    /// This entity's id and key jar, for components acting on its behalf.
    pub fn identity(&self) -> EntityIdentity {
        EntityIdentity::new(self.entity_id.clone(), Arc::clone(&self.keyjar))
    }

    /// Build the trust mark issuer described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` if the entity has no
    /// `trust_mark_issuer` section, plus any error of
    /// [`TrustMarkIssuer::new`].
    pub fn trust_mark_issuer(&self) -> Result<TrustMarkIssuer> {
        let config = self.issuer_config.clone().ok_or_else(|| {
            FederationError::Configuration(format!(
                "{} is not configured as a trust mark issuer",
                self.entity_id
            ))
        })?;
        TrustMarkIssuer::new(config, self.identity())
    }

    /// Trust `anchor` and its keys from now on.
    ///
    /// Identities handed out earlier keep the key jar they were given. The
    /// priority list is not changed; an anchor it does not name is only
    /// ever picked as the single path or as the fallback. Returns the number
    /// of keys newly added.
    pub fn import_trust_anchor(&mut self, anchor: &str, jwks: &Jwks) -> Result<usize> {
        let n = Arc::make_mut(&mut self.keyjar).import_jwks(jwks, anchor)?;
        if self.trust_anchors.insert(anchor.to_string()) {
            log::info!("trusting anchor {anchor} ({n} key(s))");
        }
        Ok(n)
    }

    /// Verified chains from `peer` to the anchors this entity trusts.
    pub fn collect_entity_statements(&self, peer: &str) -> Result<PathBundle> {
        self.collector.collect(peer)
    }

    /// Raw statements `issuer` makes about `subject`.
    pub fn load_entity_statements(
        &self,
        issuer: &str,
        subject: &str,
        query: &StatementQuery,
    ) -> Result<StatementSet> {
        self.collector.load_statement(issuer, subject, query)
    }

    /// Select the governing path of `paths` by this entity's priority.
    pub fn pick_metadata(&self, paths: &PathBundle) -> Result<Selection> {
        select(paths, &self.priority)
    }

    /// Collect chains for `peer` and select the governing metadata.
    ///
    /// # Errors
    ///
    /// `FederationError::Collection` from the collector, or
    /// `FederationError::NoTrustPath` if it returned nothing to select.
    pub fn resolve(&self, peer: &str) -> Result<Selection> {
        let paths = self.collect_entity_statements(peer)?;
        self.pick_metadata(&paths)
    }

    /// Sign an entity statement about `subject`.
    ///
    /// The statement carries `sub`, `iat`, `exp` (`iat` plus `lifetime` or
    /// the default lifetime), `metadata`, the subject's keys when this
    /// entity holds them, and the authority hints when there are any.
    /// `extra` claims are added last.
    pub fn issue_statement_about(
        &self,
        subject: &str,
        metadata: Claims,
        lifetime: Option<u64>,
        extra: Claims,
    ) -> Result<String> {
        let lifetime = lifetime.unwrap_or(self.default_lifetime);
        if lifetime == 0 {
            return Err(FederationError::Configuration(
                "statement lifetime must be positive".into(),
            ));
        }
        let iat = crate::time::now_secs();
        let exp = i64::try_from(lifetime)
            .ok()
            .and_then(|l| iat.checked_add(l))
            .ok_or_else(|| {
                FederationError::Configuration(format!("lifetime {lifetime} out of range"))
            })?;

        let mut claims = Claims::new()
            .with("sub", subject)
            .with("iat", iat)
            .with("exp", exp)
            .with("metadata", serde_json::Value::from(metadata));
        if self.keyjar.contains_owner(subject) {
            let jwks = serde_json::to_value(self.keyjar.export_jwks(subject))
                .map_err(|e| FederationError::Serialization(e.to_string()))?;
            claims.insert("jwks", jwks);
        }
        if !self.authority_hints.is_empty() {
            claims.insert("authority_hints", self.authority_hints.clone());
        }
        claims.extend(extra);

        log::debug!("issuing statement by {} about {subject}", self.entity_id);
        self.signer.sign(&claims, &self.keyjar, &self.entity_id)
    }

    /// Verify an entity statement against the keys this entity holds.
    pub fn verify_statement(&self, token: &str) -> Result<EntityStatement> {
        verify_entity_statement(token, &self.keyjar, crate::time::now_secs())
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn authority_hints(&self) -> &[String] {
        &self.authority_hints
    }

    pub fn default_lifetime(&self) -> u64 {
        self.default_lifetime
    }

    pub fn priority(&self) -> &PriorityList {
        &self.priority
    }

    /// Trusted anchor ids, sorted.
    pub fn trust_anchors(&self) -> impl Iterator<Item = &str> {
        self.trust_anchors.iter().map(String::as_str)
    }

    pub fn keyjar(&self) -> &Arc<KeyJar> {
        &self.keyjar
    }
}

impl std::fmt::Debug for FederationEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationEntity")
            .field("entity_id", &self.entity_id)
            .field("entity_type", &self.entity_type)
            .field("trust_anchors", &self.trust_anchors)
            .field("authority_hints", &self.authority_hints)
            .field("default_lifetime", &self.default_lifetime)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
