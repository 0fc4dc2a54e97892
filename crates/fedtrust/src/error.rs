//! Error types for fedtrust.
//!
//! All errors are strongly typed and surfaced to the caller unmodified;
//! nothing is retried internally. Private key material is never included
//! in error messages.

/// Federation error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum FederationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown trust mark id: {0}")]
    UnknownTrustMark(String),

    #[error("Collection failed: {0}")]
    Collection(String),

    #[error("No trust path to any trust anchor")]
    NoTrustPath,

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Issuer mismatch: expected {expected}, got {actual}")]
    IssuerMismatch { expected: String, actual: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FederationError {
    /// `true` for errors caused by configuration rather than by data or
    /// the environment: an unknown trust mark id or a malformed setting.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FederationError::Configuration(_) | FederationError::UnknownTrustMark(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FederationError>;
