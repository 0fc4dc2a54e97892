//! Claim sets — the JSON objects carried by tokens, templates and records.
//!
//! Trust mark templates, issued records, token payloads and resolved
//! metadata are all plain JSON objects. `Claims` wraps a
//! `serde_json::Map` and adds typed accessors plus an overlay operation
//! where later values win.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FederationError, Result};

/// A JSON object of claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Create an empty claim set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Look up a claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Look up a string claim. Returns `None` when absent or not a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Look up an integer claim. Returns `None` when absent or not an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Insert or replace a claim.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Remove a claim, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// `true` if the claim is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Overlay `other` onto `self`. Claims in `other` replace existing ones.
    pub fn extend(&mut self, other: Claims) {
        self.0.extend(other.0);
    }

    /// Iterate over claim names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Serialize to a compact JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| FederationError::Serialization(e.to_string()))
    }

    /// Parse a JSON object.
    pub fn from_json(s: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| FederationError::Serialization(e.to_string()))?;
        Self::try_from(value)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Claims> for Value {
    fn from(claims: Claims) -> Self {
        Value::Object(claims.0)
    }
}

impl TryFrom<Value> for Claims {
    type Error = FederationError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FederationError::Serialization(format!(
                "expected a JSON object of claims, got {other}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// `true` when the claim set carries an `exp` earlier than `now`.
///
/// A claim set without `exp` never expires.
pub fn statement_is_expired(claims: &Claims, now: i64) -> bool {
    match claims.get_i64("exp") {
        Some(exp) if exp < now => {
            log::debug!("statement expired: exp {exp} < now {now}");
            true
        }
        _ => false,
    }
}
