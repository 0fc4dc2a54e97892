//! In-memory attestation store.
//!
//! Holds the latest record per (mark id, subject). Suitable for tests and
//! short-lived issuers; everything is lost when the store is dropped.

use std::collections::BTreeMap;

use super::{validate_snapshot, AttestationStore, StoreSnapshot};
use crate::error::{FederationError, Result};
use crate::trust_mark::TrustMarkRecord;

/// In-memory attestation store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttestationStore {
    issued: BTreeMap<String, BTreeMap<String, TrustMarkRecord>>,
}

impl MemoryAttestationStore {
    /// Create an empty store for the given mark ids.
    pub fn new<I, S>(mark_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            issued: mark_ids
                .into_iter()
                .map(|id| (id.into(), BTreeMap::new()))
                .collect(),
        }
    }

    fn records(&self, mark_id: &str) -> Result<&BTreeMap<String, TrustMarkRecord>> {
        self.issued
            .get(mark_id)
            .ok_or_else(|| FederationError::UnknownTrustMark(mark_id.to_string()))
    }
}

impl AttestationStore for MemoryAttestationStore {
    fn add(&mut self, record: &TrustMarkRecord) -> Result<()> {
        let by_subject = self
            .issued
            .get_mut(&record.id)
            .ok_or_else(|| FederationError::UnknownTrustMark(record.id.clone()))?;
        by_subject.insert(record.sub.clone(), record.clone());
        Ok(())
    }

    fn find(&self, mark_id: &str, subject: &str, issued_at: Option<i64>) -> Result<bool> {
        Ok(self
            .records(mark_id)?
            .get(subject)
            .is_some_and(|rec| rec.matches(subject, issued_at)))
    }

    fn contains(&self, mark_id: &str) -> bool {
        self.issued.contains_key(mark_id)
    }

    fn mark_ids(&self) -> Vec<String> {
        self.issued.keys().cloned().collect()
    }

    fn dump(&self) -> Result<StoreSnapshot> {
        Ok(self
            .issued
            .iter()
            .map(|(id, by_subject)| (id.clone(), by_subject.values().cloned().collect()))
            .collect())
    }

    /// Replace the whole store content with `snapshot`. Mark ids missing
    /// from the snapshot end up empty.
    fn load(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        validate_snapshot(&*self, &snapshot)?;

        for by_subject in self.issued.values_mut() {
            by_subject.clear();
        }
        for (mark_id, records) in snapshot {
            if let Some(by_subject) = self.issued.get_mut(&mark_id) {
                for record in records {
                    by_subject.insert(record.sub.clone(), record);
                }
            }
        }
        Ok(())
    }
}
