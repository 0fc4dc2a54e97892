//! Storage layer for issued trust marks and entity key files.
//!
//! Every trust mark an issuer creates is recorded in an
//! [`AttestationStore`]. The store is the source of truth for
//! [`AttestationStore::find`], which callers use to decide whether a mark
//! has already been issued to a subject. Two interchangeable backends
//! implement the same contract:
//!
//! - [`memory`] — ephemeral, one record per (mark id, subject); the
//!   latest record shadows earlier ones.
//! - [`file`] — durable append log, one file per mark id, one JSON record
//!   per line. Nothing is ever rewritten or deleted.
//!
//! Both backends reject unknown mark ids with a configuration error and
//! answer `false` for a subject that has no record.
//!
//! # Snapshots
//!
//! `dump` / `dumps` produce a [`StoreSnapshot`] (mark id → records) and
//! its JSON text. `load` / `loads` are *additive* for the file backend and
//! *replace* the whole state of the memory backend.
//!
//! # Modules
//!
//! - [`memory`] — `MemoryAttestationStore`.
//! - [`file`] — `FileAttestationStore`.
//! - [`key_file`] — private JWKS file save/load.

pub mod file;
pub mod key_file;
pub mod memory;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};
use crate::trust_mark::TrustMarkRecord;

pub use file::FileAttestationStore;
pub use key_file::{load_private_jwks, save_private_jwks};
pub use memory::MemoryAttestationStore;

/// Structured snapshot of a store: mark id → issued records.
pub type StoreSnapshot = BTreeMap<String, Vec<TrustMarkRecord>>;

/// Record of every trust mark an issuer has created.
pub trait AttestationStore {
    /// Record an issued trust mark under its `id` and `sub`.
    fn add(&mut self, record: &TrustMarkRecord) -> Result<()>;

    /// Has `mark_id` been issued to `subject`? With `issued_at`, only a
    /// record with exactly that `iat` matches.
    fn find(&self, mark_id: &str, subject: &str, issued_at: Option<i64>) -> Result<bool>;

    /// Is `mark_id` configured in this store?
    fn contains(&self, mark_id: &str) -> bool;

    /// Configured mark ids, sorted.
    fn mark_ids(&self) -> Vec<String>;

    /// Snapshot every configured mark id.
    fn dump(&self) -> Result<StoreSnapshot>;

    /// Apply a snapshot. Additive or replacing depending on the backend.
    fn load(&mut self, snapshot: StoreSnapshot) -> Result<()>;

    /// Snapshot as JSON text.
    fn dumps(&self) -> Result<String> {
        serde_json::to_string(&self.dump()?)
            .map_err(|e| FederationError::Serialization(e.to_string()))
    }

    /// Apply a snapshot given as JSON text.
    fn loads(&mut self, text: &str) -> Result<()> {
        let snapshot: StoreSnapshot = serde_json::from_str(text)
            .map_err(|e| FederationError::Serialization(format!("invalid store snapshot: {e}")))?;
        self.load(snapshot)
    }
}

/// Attestation store backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-process store, lost when the issuer is dropped.
    #[default]
    Memory,
    /// One append-only file per mark id.
    File { files: BTreeMap<String, PathBuf> },
}

/// Build the configured backend for the given mark ids.
///
/// # Errors
///
/// Returns `FederationError::Configuration` if a file backend has no file
/// for one of `mark_ids`, or `FederationError::Storage` if a backing file
/// cannot be created.
pub fn open_store(config: &StoreConfig, mark_ids: &[String]) -> Result<Box<dyn AttestationStore>> {
    match config {
        StoreConfig::Memory => Ok(Box::new(MemoryAttestationStore::new(mark_ids.iter().cloned()))),
        StoreConfig::File { files } => {
            if let Some(missing) = mark_ids.iter().find(|id| !files.contains_key(*id)) {
                return Err(FederationError::Configuration(format!(
                    "no store file configured for trust mark {missing}"
                )));
            }
            for id in files.keys().filter(|id| !mark_ids.contains(*id)) {
                log::warn!("store file configured for unknown trust mark {id}");
            }
            Ok(Box::new(FileAttestationStore::open(files.clone())?))
        }
    }
}

/// Check that every snapshot entry belongs to a configured mark id and
/// that each record sits under its own id.
pub(crate) fn validate_snapshot(store: &dyn AttestationStore, snapshot: &StoreSnapshot) -> Result<()> {
    for (mark_id, records) in snapshot {
        if !store.contains(mark_id) {
            return Err(FederationError::UnknownTrustMark(mark_id.clone()));
        }
        if let Some(stray) = records.iter().find(|r| &r.id != mark_id) {
            return Err(FederationError::Configuration(format!(
                "record for {} listed under {mark_id}",
                stray.id
            )));
        }
    }
    Ok(())
}
