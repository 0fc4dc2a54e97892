//! fedtrust — trust core for federated entities.
//!
//! Provides trust path selection among verified chains to several trust
//! anchors, and issuance, recording and verification of trust marks, for
//! entities of an OpenID-style federation.

pub mod claims;
pub mod collector;
pub mod config;
pub mod crypto;
pub mod entity;
pub mod error;
pub mod selection;
pub mod statement;
pub mod storage;
pub mod time;
pub mod trust_mark;

// Re-export primary types
pub use claims::{statement_is_expired, Claims};
pub use config::FederationEntityConfig;
pub use entity::{EntityIdentity, FederationEntity};
pub use error::{FederationError, Result};
pub use selection::{select, PathBundle, PriorityList, Selection, SelectionBasis, TrustChain};

// Re-export collection types
pub use collector::{Collector, StatementQuery, StatementSet, StaticCollector};

// Re-export crypto types
pub use crypto::{FederationKey, Jwk, Jwks, JwsSigner, KeyJar, TokenSigner};

// Re-export statement and trust mark types
pub use statement::{verify_entity_statement, EntityStatement};
pub use trust_mark::{TrustMark, TrustMarkIssuer, TrustMarkIssuerConfig, TrustMarkRecord, TrustMarkSpec};

// Re-export storage types
pub use storage::{
    AttestationStore, FileAttestationStore, MemoryAttestationStore, StoreConfig, StoreSnapshot,
};
