//! Trust path selection.
//!
//! A collector may find verified chains to several trust anchors for the
//! same peer. [`select`] picks the one whose metadata governs the
//! interaction:
//!
//! 1. A bundle with a single anchor is taken as is, whatever the priority.
//! 2. Otherwise the first anchor of the [`PriorityList`] present in the
//!    bundle wins.
//! 3. Otherwise the first anchor in bundle order (the lexicographically
//!    smallest id) is taken. This is *some* trusted path with no
//!    preference behind it, and the returned [`SelectionBasis::Fallback`]
//!    says so.
//!
//! Within an anchor, the collector's first chain is used. Chain content is
//! never inspected here; verification is the collector's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::claims::Claims;
use crate::error::{FederationError, Result};

/// A verified chain of entity statements from a leaf up to a trust anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustChain {
    /// Compact statements, leaf first.
    #[serde(default)]
    pub statements: Vec<String>,
    /// Metadata resolved along the chain.
    #[serde(default)]
    pub metadata: Claims,
    /// Earliest expiry of the statements in the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TrustChain {
    pub fn new(statements: Vec<String>, metadata: Claims) -> Self {
        Self {
            statements,
            metadata,
            exp: None,
        }
    }

    pub fn with_exp(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Resolved metadata of this path.
    pub fn claims(&self) -> &Claims {
        &self.metadata
    }
}

/// Candidate chains per trust anchor.
///
/// Every anchor maps to at least one chain, in collector preference order.
/// Anchors iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<TrustChain>>",
    into = "BTreeMap<String, Vec<TrustChain>>"
)]
pub struct PathBundle {
    paths: BTreeMap<String, Vec<TrustChain>>,
}

impl PathBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chains for `anchor`, replacing any already present.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` if `chains` is empty.
    pub fn insert(&mut self, anchor: impl Into<String>, chains: Vec<TrustChain>) -> Result<()> {
        let anchor = anchor.into();
        if chains.is_empty() {
            return Err(FederationError::Configuration(format!(
                "no chains for trust anchor {anchor}"
            )));
        }
        self.paths.insert(anchor, chains);
        Ok(())
    }

    /// Append one chain for `anchor`, after those already collected.
    pub fn push(&mut self, anchor: impl Into<String>, chain: TrustChain) {
        self.paths.entry(anchor.into()).or_default().push(chain);
    }

    pub fn get(&self, anchor: &str) -> Option<&[TrustChain]> {
        self.paths.get(anchor).map(Vec::as_slice)
    }

    pub fn contains(&self, anchor: &str) -> bool {
        self.paths.contains_key(anchor)
    }

    /// Anchor ids, sorted.
    pub fn anchors(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TrustChain])> {
        self.paths.iter().map(|(a, c)| (a.as_str(), c.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn first_chain(&self, anchor: &str) -> Option<&TrustChain> {
        self.paths.get(anchor).and_then(|chains| chains.first())
    }
}

impl TryFrom<BTreeMap<String, Vec<TrustChain>>> for PathBundle {
    type Error = FederationError;

    fn try_from(paths: BTreeMap<String, Vec<TrustChain>>) -> Result<Self> {
        let mut bundle = Self::new();
        for (anchor, chains) in paths {
            bundle.insert(anchor, chains)?;
        }
        Ok(bundle)
    }
}

impl From<PathBundle> for BTreeMap<String, Vec<TrustChain>> {
    fn from(bundle: PathBundle) -> Self {
        bundle.paths
    }
}

/// Preference order over trust anchors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityList(Vec<String>);

impl PriorityList {
    /// Use `anchors` in the order given.
    pub fn new<I, S>(anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(anchors.into_iter().map(Into::into).collect())
    }

    /// Sorted, de-duplicated list of `anchors`; the default priority of an
    /// entity without an explicit one.
    pub fn from_anchors<I, S>(anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = anchors.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, anchor: &str) -> bool {
        self.0.iter().any(|a| a == anchor)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why an anchor was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionBasis {
    /// The bundle had only one anchor.
    SinglePath,
    /// The anchor ranked first in the priority list among those present.
    Priority,
    /// No prioritised anchor was present; first anchor in bundle order.
    Fallback,
}

/// The governing anchor and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: String,
    pub metadata: Claims,
    pub basis: SelectionBasis,
    /// Expiry of the selected chain, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Select the governing path from `paths`.
///
/// # Errors
///
/// Returns `FederationError::NoTrustPath` if `paths` is empty.
pub fn select(paths: &PathBundle, priority: &PriorityList) -> Result<Selection> {
    let (anchor, basis) = if paths.len() == 1 {
        (paths.anchors().next(), SelectionBasis::SinglePath)
    } else if let Some(anchor) = priority.iter().find(|a| paths.contains(a)) {
        (Some(anchor), SelectionBasis::Priority)
    } else {
        (paths.anchors().next(), SelectionBasis::Fallback)
    };

    let anchor = anchor.ok_or(FederationError::NoTrustPath)?;
    let chain = paths.first_chain(anchor).ok_or(FederationError::NoTrustPath)?;

    match basis {
        SelectionBasis::Fallback => log::warn!(
            "none of {} prioritised trust anchors reachable, falling back to {anchor}",
            priority.len()
        ),
        _ => log::debug!("selected trust anchor {anchor} ({basis:?})"),
    }

    Ok(Selection {
        anchor: anchor.to_string(),
        metadata: chain.claims().clone(),
        basis,
        exp: chain.exp,
    })
}
