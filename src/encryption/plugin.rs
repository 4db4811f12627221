//! # Field Encryption
//!
//! Binds one schema's compiled path set to a key resolver and a cipher and
//! exposes the document-level entry points.
//!
//! ## Invariants
//! - Configuration and schema errors surface at attach time
//! - A failed encrypt or decrypt leaves the caller's document unchanged
//! - Each logical key name is resolved at most once per cache lifetime

use std::sync::Arc;

use super::config::EncryptionConfig;
use crate::cipher::{Algorithm, Cipher, LocalCipher};
use crate::document::{DocumentWalker, Guard, LeafFuture, LeafTransform, Value};
use crate::error::{CryptError, CryptResult};
use crate::keys::{KeyCache, KeyResolver, KeyStore, LocalKeyVault};
use crate::path::{CanonicalPath, PathCompiler, PathSet};
use crate::schema::{Schema, SchemaRegistry};

/// Options for the read path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Return documents with their blobs intact
    pub skip_decryption: bool,
}

impl ReadOptions {
    pub fn skip_decryption() -> Self {
        Self {
            skip_decryption: true,
        }
    }
}

/// Field-level encryption for documents of one schema
pub struct FieldEncryption {
    schema: String,
    paths: Arc<PathSet>,
    algorithm: Algorithm,
    key_name: String,
    resolver: Arc<dyn KeyResolver>,
    cipher: Arc<dyn Cipher>,
    keys: KeyCache,
}

impl std::fmt::Debug for FieldEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldEncryption")
            .field("schema", &self.schema)
            .field("paths", &self.paths.to_strings())
            .field("algorithm", &self.algorithm)
            .field("key_name", &self.key_name)
            .finish_non_exhaustive()
    }
}

impl FieldEncryption {
    pub fn builder(config: EncryptionConfig) -> FieldEncryptionBuilder {
        FieldEncryptionBuilder::new(config)
    }

    /// Attaches encryption to `schema` with the given collaborators
    pub fn attach(
        schema: &Schema,
        registry: &SchemaRegistry,
        config: &EncryptionConfig,
        resolver: Arc<dyn KeyResolver>,
        cipher: Arc<dyn Cipher>,
    ) -> CryptResult<Self> {
        Self::builder(config.clone())
            .resolver(resolver)
            .cipher(cipher)
            .build_for(schema, registry)
    }

    /// Attaches encryption backed by a [`LocalKeyVault`] over `store`
    pub fn local(
        schema: &Schema,
        registry: &SchemaRegistry,
        config: &EncryptionConfig,
        store: Arc<dyn KeyStore>,
    ) -> CryptResult<Self> {
        Self::builder(config.clone())
            .key_store(store)
            .build_for(schema, registry)
    }

    /// Schema label, `id@version`
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Encrypts every sensitive plaintext leaf of `doc` in place.
    ///
    /// Returns the number of leaves encrypted. Leaves that are already
    /// opaque are skipped, so encrypting twice is a no-op. On error `doc`
    /// is left unchanged.
    pub async fn encrypt_document(&self, doc: &mut Value) -> CryptResult<usize> {
        let walked = DocumentWalker::new(&self.paths)
            .walk(doc, &EncryptLeaf(self), &Guard::Plaintext)
            .await
            .map_err(|e| self.log_failure("encrypt", e))?;

        tracing::debug!(
            event = "DOCUMENT_ENCRYPTED",
            schema = %self.schema,
            fields = walked.transformed,
        );
        *doc = walked.value;
        Ok(walked.transformed)
    }

    /// Returns an encrypted copy of `doc`
    pub async fn encrypt_instance(&self, doc: &Value) -> CryptResult<Value> {
        let mut copy = doc.clone();
        self.encrypt_document(&mut copy).await?;
        Ok(copy)
    }

    /// Decrypts every sensitive blob of `doc` in place unless the options
    /// ask to skip it. On error `doc` is left unchanged.
    pub async fn decrypt_document(&self, doc: &mut Value, options: ReadOptions) -> CryptResult<usize> {
        if options.skip_decryption {
            tracing::debug!(event = "DECRYPTION_SKIPPED", schema = %self.schema);
            return Ok(0);
        }

        let walked = DocumentWalker::new(&self.paths)
            .walk(doc, &DecryptLeaf(self), &Guard::Opaque)
            .await
            .map_err(|e| self.log_failure("decrypt", e))?;

        tracing::debug!(
            event = "DOCUMENT_DECRYPTED",
            schema = %self.schema,
            fields = walked.transformed,
        );
        *doc = walked.value;
        Ok(walked.transformed)
    }

    /// Returns a decrypted copy of `doc`
    pub async fn decrypt_instance(&self, doc: &Value) -> CryptResult<Value> {
        let mut copy = doc.clone();
        self.decrypt_document(&mut copy, ReadOptions::default()).await?;
        Ok(copy)
    }

    /// Forgets resolved key handles; the next encryption resolves again
    pub fn clear_key_cache(&self) {
        self.keys.clear();
    }

    fn log_failure(&self, operation: &'static str, err: CryptError) -> CryptError {
        tracing::warn!(
            event = "DOCUMENT_TRANSFORM_FAILED",
            schema = %self.schema,
            operation = operation,
            code = err.code(),
            error = %err,
        );
        err
    }
}

struct EncryptLeaf<'e>(&'e FieldEncryption);

impl LeafTransform for EncryptLeaf<'_> {
    fn transform<'a>(&'a self, path: &'a CanonicalPath, leaf: &'a Value) -> LeafFuture<'a> {
        let enc = self.0;
        Box::pin(async move {
            let key = enc
                .keys
                .get_or_resolve(&enc.key_name, enc.resolver.as_ref())
                .await
                .map_err(|source| CryptError::KeyResolution {
                    key_name: enc.key_name.clone(),
                    source,
                })?;

            let blob = enc
                .cipher
                .forward(leaf, key, enc.algorithm)
                .await
                .map_err(|source| CryptError::Transform {
                    path: path.to_string(),
                    source,
                })?;
            Ok(Value::Opaque(blob))
        })
    }
}

struct DecryptLeaf<'e>(&'e FieldEncryption);

impl LeafTransform for DecryptLeaf<'_> {
    fn transform<'a>(&'a self, path: &'a CanonicalPath, leaf: &'a Value) -> LeafFuture<'a> {
        let enc = self.0;
        Box::pin(async move {
            let Some(blob) = leaf.as_blob() else {
                return Ok(leaf.clone());
            };
            enc.cipher
                .backward(blob)
                .await
                .map_err(|source| CryptError::Transform {
                    path: path.to_string(),
                    source,
                })
        })
    }
}

/// Builder for [`FieldEncryption`]
pub struct FieldEncryptionBuilder {
    config: EncryptionConfig,
    resolver: Option<Arc<dyn KeyResolver>>,
    cipher: Option<Arc<dyn Cipher>>,
    store: Option<Arc<dyn KeyStore>>,
    paths: Option<PathSet>,
}

impl FieldEncryptionBuilder {
    fn new(config: EncryptionConfig) -> Self {
        Self {
            config,
            resolver: None,
            cipher: None,
            store: None,
            paths: None,
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Use a [`LocalKeyVault`] over `store` for whichever of resolver and
    /// cipher is not set explicitly
    pub fn key_store(mut self, store: Arc<dyn KeyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `paths` instead of compiling the schema
    pub fn paths(mut self, paths: PathSet) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Validates the configuration, compiles the schema, and builds.
    ///
    /// # Errors
    ///
    /// - `Configuration` for invalid config or missing collaborators
    /// - `Schema` if the schema cannot be compiled
    pub fn build_for(self, schema: &Schema, registry: &SchemaRegistry) -> CryptResult<FieldEncryption> {
        self.config.validate()?;
        let key_name = self.config.key_name()?.to_string();

        let (resolver, cipher) = match (self.resolver, self.cipher, self.store) {
            (Some(resolver), Some(cipher), _) => (resolver, cipher),
            (resolver, cipher, Some(store)) => {
                let secret = self.config.decoded_secret()?;
                let vault = Arc::new(
                    LocalKeyVault::new(self.config.key_vault.clone(), &secret, store)
                        .map_err(|e| CryptError::configuration(e.to_string()))?,
                );
                let resolver = resolver.unwrap_or_else(|| Arc::clone(&vault) as Arc<dyn KeyResolver>);
                let cipher = cipher.unwrap_or_else(|| Arc::new(LocalCipher::new(vault)) as Arc<dyn Cipher>);
                (resolver, cipher)
            }
            _ => {
                return Err(CryptError::configuration(
                    "a key resolver and cipher, or a key store, are required",
                ))
            }
        };

        let label = schema.label();
        let (paths, source) = match self.paths {
            Some(paths) => (paths, "override"),
            None => (PathCompiler::new(registry).compile(schema)?, "compiled"),
        };

        tracing::info!(
            event = "PATHS_COMPILED",
            schema = %label,
            source = source,
            paths = paths.len(),
        );

        Ok(FieldEncryption {
            schema: label,
            paths: Arc::new(paths),
            algorithm: self.config.algorithm,
            key_name,
            resolver,
            cipher,
            keys: KeyCache::new(),
        })
    }
}
