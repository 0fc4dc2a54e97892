//! Trust chain collection.
//!
//! Fetching entity statements over the network and assembling them into
//! verified chains happens outside this crate. [`Collector`] is the seam a
//! federation entity calls through. [`StaticCollector`] answers from
//! pre-collected data, for offline resolution and tests.
//!
//! A static collection file looks like:
//!
//! ```json
//! {
//!   "paths": {
//!     "https://rp.example.org": {
//!       "https://ta.example.org": [ { "statements": ["..."], "metadata": { ... } } ]
//!     }
//!   },
//!   "statements": [
//!     { "iss": "https://ta.example.org", "sub": "https://rp.example.org", "token": "..." }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FederationError, Result};
use crate::selection::PathBundle;

/// Options for a raw statement fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementQuery {
    /// Fetch operation to ask the issuer for, e.g. `"fetch"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Intended audience of the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// Ask for statements about the subject's subordinates too.
    #[serde(default)]
    pub prefetch: bool,
}

/// Raw, unfiltered compact statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementSet(Vec<String>);

impl StatementSet {
    pub fn new(statements: Vec<String>) -> Self {
        Self(statements)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Source of verified trust chains.
pub trait Collector {
    /// Collect every verified chain from `peer` to a trusted anchor.
    ///
    /// # Errors
    ///
    /// `FederationError::Collection` when no chain can be built.
    fn collect(&self, peer: &str) -> Result<PathBundle>;

    /// Fetch the raw statements `issuer` makes about `subject`.
    fn load_statement(
        &self,
        issuer: &str,
        subject: &str,
        query: &StatementQuery,
    ) -> Result<StatementSet>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredStatement {
    iss: String,
    sub: String,
    token: String,
}

/// Collector backed by pre-collected paths and statements.
///
/// Statement queries are answered from what was loaded; the operation,
/// audience and prefetch options have nothing to select on offline and
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCollector {
    #[serde(default)]
    paths: BTreeMap<String, PathBundle>,
    #[serde(default)]
    statements: Vec<StoredStatement>,
}

impl StaticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a static collection file.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::InvalidFileFormat` for a malformed file,
    /// including a path bundle with an empty chain list.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            FederationError::InvalidFileFormat(format!("{}: {e}", path.display()))
        })
    }

    /// Answer `collect(peer)` with `paths`.
    pub fn with_paths(mut self, peer: impl Into<String>, paths: PathBundle) -> Self {
        self.paths.insert(peer.into(), paths);
        self
    }

    /// Record a statement `issuer` made about `subject`.
    pub fn add_statement(
        &mut self,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        token: impl Into<String>,
    ) {
        self.statements.push(StoredStatement {
            iss: issuer.into(),
            sub: subject.into(),
            token: token.into(),
        });
    }

    /// Peers with collected paths, sorted.
    pub fn peers(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}

impl Collector for StaticCollector {
    fn collect(&self, peer: &str) -> Result<PathBundle> {
        match self.paths.get(peer) {
            Some(paths) if !paths.is_empty() => Ok(paths.clone()),
            _ => Err(FederationError::Collection(format!(
                "no trust chain collected for {peer}"
            ))),
        }
    }

    fn load_statement(
        &self,
        issuer: &str,
        subject: &str,
        query: &StatementQuery,
    ) -> Result<StatementSet> {
        log::debug!("loading statements by {issuer} about {subject} ({query:?})");
        let found: Vec<String> = self
            .statements
            .iter()
            .filter(|s| s.iss == issuer && s.sub == subject)
            .map(|s| s.token.clone())
            .collect();
        if found.is_empty() {
            return Err(FederationError::Collection(format!(
                "no statement by {issuer} about {subject}"
            )));
        }
        Ok(StatementSet::new(found))
    }
}
