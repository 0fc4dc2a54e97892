//! Private key files — an entity's signing keys as a JWKS document.
//!
//! The file is a plain JSON Web Key Set whose keys carry their private
//! `d` component:
//!
//! ```json
//! { "keys": [ { "kty": "OKP", "crv": "Ed25519", "x": "...", "d": "...", "kid": "..." } ] }
//! ```
//!
//! On Unix the file is created with mode `0600`.

use std::path::Path;

use crate::crypto::Jwks;
use crate::error::{FederationError, Result};

/// Save a private key set to `path`, replacing any existing file.
///
/// The write goes through a sibling temporary file and a rename, so a
/// reader never sees a partially written key file.
///
/// # Errors
///
/// Returns `FederationError::InvalidKey` if the set holds no private key,
/// `FederationError::Serialization` if encoding fails, or
/// `FederationError::Io` for filesystem errors.
pub fn save_private_jwks(path: &Path, jwks: &Jwks) -> Result<()> {
    if !jwks.has_private_keys() {
        return Err(FederationError::InvalidKey(
            "refusing to write a key file without private keys".into(),
        ));
    }
    let json = serde_json::to_string_pretty(jwks)
        .map_err(|e| FederationError::Serialization(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// Load a private key set from `path`.
///
/// # Errors
///
/// Returns `FederationError::InvalidFileFormat` for malformed files or
/// `FederationError::Io` for filesystem errors.
pub fn load_private_jwks(path: &Path) -> Result<Jwks> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        FederationError::InvalidFileFormat(format!(
            "failed to parse key file {}: {e}",
            path.display()
        ))
    })
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("jwks.tmp");
    std::fs::write(&tmp_path, data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
