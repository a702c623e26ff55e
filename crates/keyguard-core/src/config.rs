//! Immutable configuration for the crypto components.
//!
//! Built once at startup (usually from JSON) and handed to each component
//! constructor. Components copy what they need; nothing reads configuration
//! from globals.

use crate::error::CryptoError;
use crate::keypair::RsaConfig;
use crate::password::Argon2idParams;
use crate::token::TokenConfig;
use serde::{Deserialize, Serialize};

/// Algorithm cost parameters, key sizes, and token defaults.
///
/// Every field has a default, so `{}` is a valid configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id cost for new password hashes.
    pub password: Argon2idParams,
    /// RSA key generation sizes.
    pub rsa: RsaConfig,
    /// Token lifetime and issuer.
    pub token: TokenConfig,
}

impl CryptoConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Config` for unparseable JSON or rejected values.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CryptoError::Config(format!("unparseable configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Config` naming the first rejected value.
    pub fn validate(&self) -> Result<(), CryptoError> {
        let result = self
            .password
            .validate()
            .and_then(|()| self.rsa.validate())
            .and_then(|()| self.token.validate());
        if let Err(e) = &result {
            tracing::warn!("rejected crypto configuration: {e}");
        }
        result
    }
}
