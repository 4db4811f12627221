//! # Local Cipher
//!
//! AES-256-GCM over the JSON encoding of a scalar, keyed by data keys from a
//! [`LocalKeyVault`].
//!
//! Blob layout:
//!
//! ```text
//! version (1) | algorithm (1) | key id (16) | nonce (12) | ciphertext + tag
//! ```
//!
//! The 18-byte header is authenticated as associated data.

use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::algorithm::Algorithm;
use super::{Cipher, CipherError, CipherFuture};
use crate::document::{Blob, Value};
use crate::keys::{KeyHandle, LocalKeyVault};

/// Current blob format version
pub const BLOB_VERSION: u8 = 1;

const HEADER_LEN: usize = 18;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct LocalCipher {
    vault: Arc<LocalKeyVault>,
}

impl LocalCipher {
    pub fn new(vault: Arc<LocalKeyVault>) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &Arc<LocalKeyVault> {
        &self.vault
    }

    fn seal(&self, plain: &Value, key: KeyHandle, algorithm: Algorithm) -> Result<Blob, CipherError> {
        if !plain.is_plaintext() {
            return Err(CipherError::NotScalar);
        }
        let plaintext = serde_json::to_vec(&serde_json::Value::from(plain.clone()))
            .map_err(|e| CipherError::Encoding(e.to_string()))?;
        let material = self.vault.unwrap_key(key.id())?;

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.push(BLOB_VERSION);
        header.push(algorithm.tag());
        header.extend_from_slice(key.id().as_bytes());

        let nonce = match algorithm {
            Algorithm::Deterministic => {
                let digest = Sha256::new()
                    .chain_update(&material[..])
                    .chain_update(&header)
                    .chain_update(&plaintext)
                    .finalize();
                let mut nonce = [0u8; NONCE_LEN];
                nonce.copy_from_slice(&digest[..NONCE_LEN]);
                nonce
            }
            Algorithm::Random => {
                let mut nonce = [0u8; NONCE_LEN];
                OsRng.fill_bytes(&mut nonce);
                nonce
            }
        };

        let ciphertext = Aes256Gcm::new_from_slice(&material[..])
            .map_err(|_| CipherError::Encryption)?
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &plaintext,
                    aad: &header,
                },
            )
            .map_err(|_| CipherError::Encryption)?;

        let mut out = header;
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(Blob::new(out))
    }

    fn open(&self, blob: &Blob) -> Result<Value, CipherError> {
        let bytes = blob.as_bytes();
        if bytes.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
            return Err(CipherError::MalformedBlob("too short"));
        }
        if bytes[0] != BLOB_VERSION {
            return Err(CipherError::MalformedBlob("unknown version"));
        }
        if Algorithm::from_tag(bytes[1]).is_none() {
            return Err(CipherError::MalformedBlob("unknown algorithm"));
        }

        let (header, rest) = bytes.split_at(HEADER_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let key_id = Uuid::from_slice(&header[2..])
            .map_err(|_| CipherError::MalformedBlob("bad key id"))?;

        let material = self.vault.unwrap_key(key_id)?;
        let plaintext = Aes256Gcm::new_from_slice(&material[..])
            .map_err(|_| CipherError::Authentication)?
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| CipherError::Authentication)?;

        let decoded: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|e| CipherError::Encoding(e.to_string()))?;
        match decoded {
            serde_json::Value::String(_) | serde_json::Value::Number(_) => Ok(Value::from(decoded)),
            _ => Err(CipherError::NotScalar),
        }
    }
}

impl Cipher for LocalCipher {
    fn forward<'a>(
        &'a self,
        plain: &'a Value,
        key: KeyHandle,
        algorithm: Algorithm,
    ) -> CipherFuture<'a, Blob> {
        Box::pin(async move { self.seal(plain, key, algorithm) })
    }

    fn backward<'a>(&'a self, blob: &'a Blob) -> CipherFuture<'a, Value> {
        Box::pin(async move { self.open(blob) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyVaultNamespace, MemoryKeyStore};

    async fn cipher() -> (LocalCipher, KeyHandle) {
        let vault = LocalKeyVault::new(
            KeyVaultNamespace::default(),
            &[3u8; 32],
            Arc::new(MemoryKeyStore::new()),
        )
        .unwrap();
        let key = vault.find_or_mint("test").await.unwrap();
        (LocalCipher::new(Arc::new(vault)), key)
    }

    #[tokio::test]
    async fn test_scalars_keep_their_type() {
        let (cipher, key) = cipher().await;
        for plain in [
            Value::from("123"),
            Value::from(123_i64),
            Value::from(serde_json::json!(1.5)),
        ] {
            let blob = cipher.forward(&plain, key, Algorithm::Random).await.unwrap();
            assert_eq!(cipher.backward(&blob).await.unwrap(), plain);
        }
    }

    #[tokio::test]
    async fn test_deterministic_vs_random() {
        let (cipher, key) = cipher().await;
        let plain = Value::from("secret");

        let a = cipher.forward(&plain, key, Algorithm::Deterministic).await.unwrap();
        let b = cipher.forward(&plain, key, Algorithm::Deterministic).await.unwrap();
        assert_eq!(a, b);

        let c = cipher.forward(&plain, key, Algorithm::Random).await.unwrap();
        let d = cipher.forward(&plain, key, Algorithm::Random).await.unwrap();
        assert_ne!(c, d);
    }

    #[tokio::test]
    async fn test_rejects_non_scalars() {
        let (cipher, key) = cipher().await;
        let err = cipher
            .forward(&Value::Bool(true), key, Algorithm::Deterministic)
            .await
            .unwrap_err();
        assert!(matches!(err, CipherError::NotScalar));
    }

    #[tokio::test]
    async fn test_tampering_is_detected() {
        let (cipher, key) = cipher().await;
        let blob = cipher
            .forward(&Value::from("x"), key, Algorithm::Deterministic)
            .await
            .unwrap();

        let mut bytes = blob.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let err = cipher.backward(&Blob::new(bytes)).await.unwrap_err();
        assert!(matches!(err, CipherError::Authentication));
    }

    #[tokio::test]
    async fn test_malformed_blobs() {
        let (cipher, _) = cipher().await;

        let short = cipher.backward(&Blob::new(vec![1, 2, 3])).await.unwrap_err();
        assert!(matches!(short, CipherError::MalformedBlob("too short")));

        let mut bytes = vec![9u8; HEADER_LEN + NONCE_LEN + TAG_LEN];
        let version = cipher.backward(&Blob::new(bytes.clone())).await.unwrap_err();
        assert!(matches!(version, CipherError::MalformedBlob("unknown version")));

        bytes[0] = BLOB_VERSION;
        bytes[1] = 1;
        let unknown_key = cipher.backward(&Blob::new(bytes)).await.unwrap_err();
        assert!(matches!(unknown_key, CipherError::Key(_)));
    }
}
