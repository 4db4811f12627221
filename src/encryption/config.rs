//! Encryption Configuration
//!
//! Algorithm, master secret, key name, and key vault location.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::cipher::Algorithm;
use crate::error::{CryptError, CryptResult};
use crate::keys::{KeyVaultNamespace, MIN_SECRET_LEN};

/// Field encryption configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Algorithm for new blobs (default: deterministic)
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Hex-encoded master secret, at least 32 bytes once decoded
    #[serde(default)]
    pub master_secret: Option<String>,

    /// Alternate name of the data key used for encryption
    #[serde(default)]
    pub key_name: Option<String>,

    /// Key vault location (default: "encryption.__keyVault")
    #[serde(default)]
    pub key_vault: KeyVaultNamespace,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("algorithm", &self.algorithm)
            .field("master_secret", &self.master_secret.as_ref().map(|_| "<redacted>"))
            .field("key_name", &self.key_name)
            .field("key_vault", &self.key_vault)
            .finish()
    }
}

impl EncryptionConfig {
    pub fn new(master_secret: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self {
            master_secret: Some(master_secret.into()),
            key_name: Some(key_name.into()),
            ..Default::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_key_vault(mut self, key_vault: KeyVaultNamespace) -> Self {
        self.key_vault = key_vault;
        self
    }

    /// Checks everything attach needs.
    ///
    /// # Errors
    ///
    /// `Configuration` if the secret or key name is missing, the secret is
    /// not hex or too short, or the key vault namespace is incomplete.
    pub fn validate(&self) -> CryptResult<()> {
        self.decoded_secret()?;
        self.key_name()?;
        if !self.key_vault.is_complete() {
            return Err(CryptError::configuration(format!(
                "key vault namespace '{}' is incomplete",
                self.key_vault
            )));
        }
        Ok(())
    }

    /// The key name, or a configuration error if unset
    pub fn key_name(&self) -> CryptResult<&str> {
        match self.key_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(CryptError::configuration("key_name is required")),
        }
    }

    /// The decoded master secret
    pub fn decoded_secret(&self) -> CryptResult<Zeroizing<Vec<u8>>> {
        let hex_secret = self
            .master_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CryptError::configuration("master_secret is required"))?;

        let secret = Zeroizing::new(hex::decode(hex_secret).map_err(|e| {
            CryptError::configuration(format!("master_secret is not valid hex: {}", e))
        })?);

        if secret.len() < MIN_SECRET_LEN {
            return Err(CryptError::configuration(format!(
                "master_secret must decode to at least {} bytes, got {}",
                MIN_SECRET_LEN,
                secret.len()
            )));
        }
        Ok(secret)
    }
}
