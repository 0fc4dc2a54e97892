//! File-backed attestation store.
//!
//! Each configured trust mark id maps to one file. Every issued mark is
//! appended to its file as a single JSON line:
//!
//! ```text
//! {"id":"https://refeds.org/sirtfi","sub":"https://rp.example.org","iat":1700000000,...}
//! {"id":"https://refeds.org/sirtfi","sub":"https://op.example.org","iat":1700000042,...}
//! ```
//!
//! Files are created empty when the store is opened. Nothing is ever
//! rewritten, compacted or deleted; rotate the files externally if
//! growth matters. There is no locking: keep one writer per file.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{validate_snapshot, AttestationStore, StoreSnapshot};
use crate::error::{FederationError, Result};
use crate::trust_mark::TrustMarkRecord;

/// Append-only, file-per-mark attestation store.
#[derive(Debug, Clone)]
pub struct FileAttestationStore {
    files: BTreeMap<String, PathBuf>,
}

impl FileAttestationStore {
    /// Open a store over `files` (mark id → path).
    ///
    /// Missing files and their parent directories are created empty.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Storage` if a file cannot be created.
    pub fn open(files: BTreeMap<String, PathBuf>) -> Result<Self> {
        for (mark_id, path) in &files {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
            }
            if !path.exists() {
                log::info!("creating trust mark store for {mark_id} at {}", path.display());
            }
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| storage_error(path, e))?;
        }
        Ok(Self { files })
    }

    /// Backing file of `mark_id`.
    pub fn path(&self, mark_id: &str) -> Result<&Path> {
        self.files
            .get(mark_id)
            .map(PathBuf::as_path)
            .ok_or_else(|| FederationError::UnknownTrustMark(mark_id.to_string()))
    }

    /// Every record in the file of `mark_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::InvalidFileFormat` naming the file and line
    /// for a line that is not a record. Blank lines are skipped.
    pub fn records(&self, mark_id: &str) -> Result<Vec<TrustMarkRecord>> {
        let path = self.path(mark_id)?;
        let content = std::fs::read_to_string(path).map_err(|e| storage_error(path, e))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                TrustMarkRecord::from_json(line).map_err(|e| {
                    FederationError::InvalidFileFormat(format!(
                        "{}:{}: {e}",
                        path.display(),
                        n + 1
                    ))
                })
            })
            .collect()
    }

    fn append(&self, mark_id: &str, records: &[TrustMarkRecord]) -> Result<()> {
        let path = self.path(mark_id)?;
        let mut buf = String::new();
        for record in records {
            buf.push_str(&record.to_json()?);
            buf.push('\n');
        }

        // The file must already exist; it was created on open.
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| storage_error(path, e))?;
        file.write_all(buf.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| storage_error(path, e))
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> FederationError {
    FederationError::Storage(format!("{}: {err}", path.display()))
}

impl AttestationStore for FileAttestationStore {
    fn add(&mut self, record: &TrustMarkRecord) -> Result<()> {
        self.append(&record.id, std::slice::from_ref(record))
    }

    /// Scans newest-first so the most recent record for a subject is
    /// checked before older ones.
    fn find(&self, mark_id: &str, subject: &str, issued_at: Option<i64>) -> Result<bool> {
        Ok(self
            .records(mark_id)?
            .iter()
            .rev()
            .any(|rec| rec.matches(subject, issued_at)))
    }

    fn contains(&self, mark_id: &str) -> bool {
        self.files.contains_key(mark_id)
    }

    fn mark_ids(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn dump(&self) -> Result<StoreSnapshot> {
        self.files
            .keys()
            .map(|id| Ok((id.clone(), self.records(id)?)))
            .collect()
    }

    /// Append every record of `snapshot` to its file. Existing records are
    /// kept, so loading the same snapshot twice duplicates it.
    fn load(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        validate_snapshot(&*self, &snapshot)?;
        for (mark_id, records) in &snapshot {
            self.append(mark_id, records)?;
        }
        Ok(())
    }
}
