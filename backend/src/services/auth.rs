//! Admin secret check guarding destructive operations
//!
//! There are no user accounts: deleting, archiving and restoring records asks
//! for one shared password taken from configuration. The configured secret is
//! kept only as an HMAC tag and candidates are compared in constant time.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const TAG_KEY: &[u8] = b"cafe-inventory-admin";

/// Verifies the shared admin password
#[derive(Clone)]
pub struct AdminGuard {
    tag: Vec<u8>,
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGuard").finish_non_exhaustive()
    }
}

impl AdminGuard {
    /// Create a guard for the configured secret
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::Configuration("admin password is empty".to_string()));
        }
        let tag = mac_for(secret)?.finalize().into_bytes().to_vec();
        Ok(Self { tag })
    }

    /// Check a submitted password; a missing one is treated as wrong
    pub fn check(&self, candidate: Option<&str>) -> AppResult<()> {
        let candidate = candidate.unwrap_or_default();
        if mac_for(candidate)?.verify_slice(&self.tag).is_err() {
            tracing::warn!("Rejected admin password");
            return Err(AppError::InvalidPassword);
        }
        Ok(())
    }
}

/// Body of a delete request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteInput {
    #[serde(default)]
    pub password: Option<String>,
}

fn mac_for(value: &str) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(TAG_KEY)
        .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))?;
    mac.update(value.as_bytes());
    Ok(mac)
}
