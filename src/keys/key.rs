//! # Data Keys
//!
//! A data key is a random 32-byte AES key, stored wrapped under the vault's
//! master key and addressed by id or by one of its alternate names.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of data key material in bytes
pub const DATA_KEY_LEN: usize = 32;

fn default_db_name() -> String {
    "encryption".to_string()
}

fn default_collection_name() -> String {
    "__keyVault".to_string()
}

/// Where data keys live, as `<db>.<collection>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyVaultNamespace {
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

impl Default for KeyVaultNamespace {
    fn default() -> Self {
        Self {
            db_name: default_db_name(),
            collection_name: default_collection_name(),
        }
    }
}

impl KeyVaultNamespace {
    pub fn new(db_name: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            collection_name: collection_name.into(),
        }
    }

    /// Both parts are non-empty
    pub fn is_complete(&self) -> bool {
        !self.db_name.trim().is_empty() && !self.collection_name.trim().is_empty()
    }
}

impl fmt::Display for KeyVaultNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db_name, self.collection_name)
    }
}

/// Reference to a data key, handed to the cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHandle(Uuid);

impl KeyHandle {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored data key record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataKey {
    pub id: Uuid,
    #[serde(default)]
    pub key_alt_names: Vec<String>,
    /// Base64 of `nonce || ciphertext+tag` under the master key
    pub key_material: String,
    pub created_at: DateTime<Utc>,
}

impl DataKey {
    pub fn handle(&self) -> KeyHandle {
        KeyHandle(self.id)
    }

    pub fn has_alt_name(&self, name: &str) -> bool {
        self.key_alt_names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace() {
        let ns = KeyVaultNamespace::default();
        assert_eq!(ns.to_string(), "encryption.__keyVault");
        assert!(ns.is_complete());
        assert!(!KeyVaultNamespace::new("encryption", " ").is_complete());
    }

    #[test]
    fn test_namespace_defaults_from_json() {
        let ns: KeyVaultNamespace = serde_json::from_str(r#"{"db_name": "vault"}"#).unwrap();
        assert_eq!(ns.to_string(), "vault.__keyVault");
    }

    #[test]
    fn test_data_key_json_shape() {
        let key = DataKey {
            id: Uuid::nil(),
            key_alt_names: vec!["blog-key".into()],
            key_material: "AAAA".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["keyAltNames"][0], "blog-key");
        assert!(json.get("keyMaterial").is_some());
        assert!(key.has_alt_name("blog-key"));
        assert_eq!(key.handle().id(), Uuid::nil());
    }
}
