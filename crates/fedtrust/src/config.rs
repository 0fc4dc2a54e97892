//! Federation entity configuration.
//!
//! An entity is configured from one JSON document:
//!
//! ```json
//! {
//!   "entity_id": "https://tmi.example.org",
//!   "entity_type": "federation_entity",
//!   "key_file": "keys/private.jwks",
//!   "trust_anchors": { "https://ta.example.org": { "keys": [ ... ] } },
//!   "authority_hints": ["https://ta.example.org"],
//!   "default_lifetime": 86400,
//!   "priority": ["https://ta.example.org"],
//!   "trust_mark_issuer": {
//!     "trust_mark_specification": { "https://refeds.org/sirtfi": { "lifetime": 2592000 } },
//!     "trust_mark_db": { "backend": "memory" }
//!   }
//! }
//! ```
//!
//! Relative paths are taken as given, i.e. relative to the working
//! directory of the process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::Jwks;
use crate::error::{FederationError, Result};
use crate::trust_mark::TrustMarkIssuerConfig;

/// Statement lifetime used when neither the caller nor the config sets one.
pub const DEFAULT_STATEMENT_LIFETIME: u64 = 86_400;

/// Entity type of a plain federation entity.
pub const DEFAULT_ENTITY_TYPE: &str = "federation_entity";

fn default_entity_type() -> String {
    DEFAULT_ENTITY_TYPE.to_string()
}

fn default_lifetime() -> u64 {
    DEFAULT_STATEMENT_LIFETIME
}

/// Everything needed to build a `FederationEntity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FederationEntityConfig {
    pub entity_id: String,
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    /// Private JWKS holding the entity's signing keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// Trusted anchors and their public keys.
    #[serde(default)]
    pub trust_anchors: BTreeMap<String, Jwks>,
    /// Superiors that can issue statements about this entity.
    #[serde(default)]
    pub authority_hints: Vec<String>,
    /// Default lifetime of issued entity statements, in seconds.
    #[serde(default = "default_lifetime")]
    pub default_lifetime: u64,
    /// Anchor preference. Defaults to the sorted trust anchor ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_mark_issuer: Option<TrustMarkIssuerConfig>,
}

impl FederationEntityConfig {
    /// Minimal configuration for `entity_id`.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: default_entity_type(),
            key_file: None,
            trust_anchors: BTreeMap::new(),
            authority_hints: Vec::new(),
            default_lifetime: DEFAULT_STATEMENT_LIFETIME,
            priority: None,
            trust_mark_issuer: None,
        }
    }

    /// Read and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::InvalidFileFormat` if the file is not a
    /// valid configuration document (including unknown fields),
    /// `FederationError::Configuration` if it fails validation, or
    /// `FederationError::Io` if it cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            FederationError::InvalidFileFormat(format!(
                "failed to parse config {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        log::debug!("loaded configuration for {} from {}", config.entity_id, path.display());
        Ok(config)
    }

    /// Check settings that the document format alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.entity_id.trim().is_empty() {
            return Err(FederationError::Configuration(
                "entity_id must not be empty".into(),
            ));
        }
        if self.default_lifetime == 0 {
            return Err(FederationError::Configuration(
                "default_lifetime must be positive".into(),
            ));
        }
        if let Some((anchor, _)) = self.trust_anchors.iter().find(|(_, jwks)| jwks.is_empty()) {
            return Err(FederationError::Configuration(format!(
                "trust anchor {anchor} has no keys"
            )));
        }
        Ok(())
    }
}
