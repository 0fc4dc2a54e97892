//! Trust mark specifications — per-mark claim templates and lifetimes.
//!
//! A specification is configured once per mark id. Its optional
//! `lifetime` is pulled out of the template when the configuration is
//! read, so it never ends up in an issued mark as an ordinary claim.
//!
//! ```json
//! {
//!   "https://refeds.org/sirtfi": {
//!     "ref": "https://refeds.org/sirtfi",
//!     "lifetime": 2592000
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::claims::Claims;
use crate::error::{FederationError, Result};

/// Template for one trust mark id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustMarkSpec {
    /// Validity period in seconds. Issued marks get `exp = iat + lifetime`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u64>,
    /// Claims copied into every issued mark.
    #[serde(flatten)]
    pub claims: Claims,
}

impl TrustMarkSpec {
    pub fn new(claims: Claims) -> Self {
        Self {
            lifetime: None,
            claims,
        }
    }

    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = Some(seconds);
        self
    }

    /// Reject specifications that cannot produce a valid mark.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` for an empty mark id or a
    /// zero lifetime.
    pub fn validate(&self, mark_id: &str) -> Result<()> {
        if mark_id.trim().is_empty() {
            return Err(FederationError::Configuration(
                "trust mark id must not be empty".into(),
            ));
        }
        if self.lifetime == Some(0) {
            return Err(FederationError::Configuration(format!(
                "trust mark {mark_id}: lifetime must be positive"
            )));
        }
        Ok(())
    }
}
