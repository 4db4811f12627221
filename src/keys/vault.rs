//! # Local Key Vault
//!
//! Local key provider: data keys are wrapped with AES-256-GCM under a master
//! key derived from the configured secret and kept in a [`KeyStore`].
//!
//! ## Invariants
//! - Concurrent resolutions of one name in this process mint at most one key
//! - Unwrapped material never reaches the store and is zeroized on drop

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::errors::{KeyError, KeyResult};
use super::key::{DataKey, KeyHandle, KeyVaultNamespace, DATA_KEY_LEN};
use super::resolver::{KeyResolver, ResolveFuture};
use super::store::KeyStore;

/// Minimum master secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

const WRAP_NONCE_LEN: usize = 12;

/// Unwrapped data key material
pub type KeyMaterial = Arc<Zeroizing<[u8; DATA_KEY_LEN]>>;

/// Key vault backed by a local master secret
pub struct LocalKeyVault {
    namespace: KeyVaultNamespace,
    master: Zeroizing<[u8; 32]>,
    store: Arc<dyn KeyStore>,
    mint_lock: Mutex<()>,
    unwrapped: RwLock<HashMap<Uuid, KeyMaterial>>,
}

impl std::fmt::Debug for LocalKeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyVault")
            .field("namespace", &self.namespace)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl LocalKeyVault {
    /// Creates a vault over `store`.
    ///
    /// # Errors
    ///
    /// `InvalidSecret` if the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn new(
        namespace: KeyVaultNamespace,
        secret: &[u8],
        store: Arc<dyn KeyStore>,
    ) -> KeyResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(KeyError::InvalidSecret(format!(
                "expected at least {} bytes, got {}",
                MIN_SECRET_LEN,
                secret.len()
            )));
        }

        let mut master = Zeroizing::new([0u8; 32]);
        master.copy_from_slice(&Sha256::digest(secret));

        Ok(Self {
            namespace,
            master,
            store,
            mint_lock: Mutex::new(()),
            unwrapped: RwLock::new(HashMap::new()),
        })
    }

    /// Creates a vault from a hex-encoded secret
    pub fn from_hex(
        namespace: KeyVaultNamespace,
        secret_hex: &str,
        store: Arc<dyn KeyStore>,
    ) -> KeyResult<Self> {
        let secret = Zeroizing::new(
            hex::decode(secret_hex.trim())
                .map_err(|e| KeyError::InvalidSecret(format!("not valid hex: {}", e)))?,
        );
        Self::new(namespace, &secret, store)
    }

    pub fn namespace(&self) -> &KeyVaultNamespace {
        &self.namespace
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    /// Finds the key named `key_name`, minting it on first use
    pub async fn find_or_mint(&self, key_name: &str) -> KeyResult<KeyHandle> {
        if let Some(key) = self.store.find_by_alt_name(&self.namespace, key_name)? {
            tracing::debug!(
                event = "DATA_KEY_RESOLVED",
                key_name = key_name,
                key_id = %key.id,
                namespace = %self.namespace,
            );
            return Ok(key.handle());
        }

        let _guard = self.mint_lock.lock().await;

        // Another caller may have minted while we waited
        if let Some(key) = self.store.find_by_alt_name(&self.namespace, key_name)? {
            return Ok(key.handle());
        }

        let key = self.mint(key_name)?;
        let handle = key.handle();
        self.store.insert(&self.namespace, key)?;

        tracing::info!(
            event = "DATA_KEY_MINTED",
            key_name = key_name,
            key_id = %handle,
            namespace = %self.namespace,
        );
        Ok(handle)
    }

    fn mint(&self, key_name: &str) -> KeyResult<DataKey> {
        let id = Uuid::new_v4();
        let mut material = Zeroizing::new([0u8; DATA_KEY_LEN]);
        OsRng.fill_bytes(&mut material[..]);

        let mut nonce = [0u8; WRAP_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let wrapped = self
            .master_cipher()?
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &material[..],
                    aad: id.as_bytes(),
                },
            )
            .map_err(|_| KeyError::Mint(key_name.to_string()))?;

        let mut stored = Vec::with_capacity(WRAP_NONCE_LEN + wrapped.len());
        stored.extend_from_slice(&nonce);
        stored.extend_from_slice(&wrapped);

        Ok(DataKey {
            id,
            key_alt_names: vec![key_name.to_string()],
            key_material: STANDARD.encode(stored),
            created_at: Utc::now(),
        })
    }

    /// Returns the plaintext material of a data key
    pub fn unwrap_key(&self, id: Uuid) -> KeyResult<KeyMaterial> {
        if let Some(material) = self
            .unwrapped
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(Arc::clone(material));
        }

        let key = self
            .store
            .find_by_id(&self.namespace, id)?
            .ok_or(KeyError::NotFound(id))?;

        let stored = STANDARD
            .decode(&key.key_material)
            .map_err(|_| KeyError::Unwrap(id))?;
        if stored.len() <= WRAP_NONCE_LEN {
            return Err(KeyError::Unwrap(id));
        }
        let (nonce, wrapped) = stored.split_at(WRAP_NONCE_LEN);

        let plain = Zeroizing::new(
            self.master_cipher()?
                .decrypt(
                    Nonce::from_slice(nonce),
                    Payload {
                        msg: wrapped,
                        aad: id.as_bytes(),
                    },
                )
                .map_err(|_| KeyError::Unwrap(id))?,
        );
        if plain.len() != DATA_KEY_LEN {
            return Err(KeyError::Unwrap(id));
        }

        let mut material = Zeroizing::new([0u8; DATA_KEY_LEN]);
        material.copy_from_slice(&plain);
        let material = Arc::new(material);

        self.unwrapped
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&material));
        Ok(material)
    }

    fn master_cipher(&self) -> KeyResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.master[..])
            .map_err(|_| KeyError::InvalidSecret("master key has wrong length".to_string()))
    }
}

impl KeyResolver for LocalKeyVault {
    fn resolve<'a>(&'a self, key_name: &'a str) -> ResolveFuture<'a> {
        Box::pin(self.find_or_mint(key_name))
    }
}
