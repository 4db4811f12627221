//! # Key Stores
//!
//! Persistence for wrapped data keys, partitioned by key vault namespace.
//! Stores only ever see wrapped material.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use uuid::Uuid;

use super::errors::{KeyError, KeyResult};
use super::key::{DataKey, KeyVaultNamespace};

/// Backend trait for data key persistence
pub trait KeyStore: Send + Sync + fmt::Debug {
    /// Find the key carrying `alt_name`
    fn find_by_alt_name(&self, ns: &KeyVaultNamespace, alt_name: &str)
        -> KeyResult<Option<DataKey>>;

    /// Find a key by id
    fn find_by_id(&self, ns: &KeyVaultNamespace, id: Uuid) -> KeyResult<Option<DataKey>>;

    /// Insert a new key. Fails if the id or any alt name is already taken.
    fn insert(&self, ns: &KeyVaultNamespace, key: DataKey) -> KeyResult<()>;

    /// All keys in the namespace, in insertion order
    fn list(&self, ns: &KeyVaultNamespace) -> KeyResult<Vec<DataKey>>;
}

fn check_unique(existing: &[DataKey], key: &DataKey) -> KeyResult<()> {
    if existing.iter().any(|k| k.id == key.id) {
        return Err(KeyError::Store(format!("duplicate key id {}", key.id)));
    }
    if let Some(name) = key
        .key_alt_names
        .iter()
        .find(|name| existing.iter().any(|k| k.has_alt_name(name)))
    {
        return Err(KeyError::Store(format!("duplicate key alt name '{}'", name)));
    }
    Ok(())
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<KeyVaultNamespace, Vec<DataKey>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn find_by_alt_name(
        &self,
        ns: &KeyVaultNamespace,
        alt_name: &str,
    ) -> KeyResult<Option<DataKey>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .get(ns)
            .and_then(|list| list.iter().find(|k| k.has_alt_name(alt_name)))
            .cloned())
    }

    fn find_by_id(&self, ns: &KeyVaultNamespace, id: Uuid) -> KeyResult<Option<DataKey>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .get(ns)
            .and_then(|list| list.iter().find(|k| k.id == id))
            .cloned())
    }

    fn insert(&self, ns: &KeyVaultNamespace, key: DataKey) -> KeyResult<()> {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        let list = keys.entry(ns.clone()).or_default();
        check_unique(list, &key)?;
        list.push(key);
        Ok(())
    }

    fn list(&self, ns: &KeyVaultNamespace) -> KeyResult<Vec<DataKey>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys.get(ns).cloned().unwrap_or_default())
    }
}

/// Filesystem store: one JSON array per namespace at
/// `<data_dir>/keyvault/<db>.<collection>.json`
#[derive(Debug)]
pub struct FileKeyStore {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileKeyStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("keyvault"),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, ns: &KeyVaultNamespace) -> PathBuf {
        self.root.join(format!("{}.json", ns))
    }

    fn read_all(&self, ns: &KeyVaultNamespace) -> KeyResult<Vec<DataKey>> {
        let path = self.file_path(ns);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(KeyError::Store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content)
            .map_err(|e| KeyError::Store(format!("invalid key file {}: {}", path.display(), e)))
    }

    fn write_all(&self, ns: &KeyVaultNamespace, keys: &[DataKey]) -> KeyResult<()> {
        fs::create_dir_all(&self.root).map_err(KeyError::store)?;

        let path = self.file_path(ns);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(keys).map_err(KeyError::store)?;

        // Write then rename so readers never see a torn file
        fs::write(&tmp, content).map_err(KeyError::store)?;
        fs::rename(&tmp, &path).map_err(KeyError::store)
    }
}

impl KeyStore for FileKeyStore {
    fn find_by_alt_name(
        &self,
        ns: &KeyVaultNamespace,
        alt_name: &str,
    ) -> KeyResult<Option<DataKey>> {
        Ok(self
            .read_all(ns)?
            .into_iter()
            .find(|k| k.has_alt_name(alt_name)))
    }

    fn find_by_id(&self, ns: &KeyVaultNamespace, id: Uuid) -> KeyResult<Option<DataKey>> {
        Ok(self.read_all(ns)?.into_iter().find(|k| k.id == id))
    }

    fn insert(&self, ns: &KeyVaultNamespace, key: DataKey) -> KeyResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys = self.read_all(ns)?;
        check_unique(&keys, &key)?;
        keys.push(key);
        self.write_all(ns, &keys)
    }

    fn list(&self, ns: &KeyVaultNamespace) -> KeyResult<Vec<DataKey>> {
        self.read_all(ns)
    }
}
