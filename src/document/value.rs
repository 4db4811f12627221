//! Document values
//!
//! A JSON-like value tree with two additions the walker relies on:
//! - `Opaque` holds an already-transformed blob and is never mistaken for
//!   plaintext. In JSON it is the extended form
//!   `{"$binary": {"base64": "...", "subType": "06"}}`.
//! - `Document` is an embedded sub-document. It walks like its field map
//!   but keeps its schema reference.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number};

/// Extended JSON key for binary values
pub const BINARY_KEY: &str = "$binary";

/// Binary subtype used for encrypted payloads
pub const ENCRYPTED_SUBTYPE: &str = "06";

/// Field map of an object or sub-document
pub type Map = BTreeMap<String, Value>;

/// Opaque transformed payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blob(Vec<u8>);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Option<Self> {
        STANDARD.decode(encoded).ok().map(Self)
    }
}

/// Embedded sub-document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    schema_id: String,
    fields: Map,
}

impl Document {
    pub fn new(schema_id: impl Into<String>, fields: Map) -> Self {
        Self {
            schema_id: schema_id.into(),
            fields,
        }
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map {
        &mut self.fields
    }

    pub fn into_fields(self) -> Map {
        self.fields
    }

    /// Same schema reference, different fields
    pub(crate) fn with_fields(&self, fields: Map) -> Self {
        Self {
            schema_id: self.schema_id.clone(),
            fields,
        }
    }
}

/// A document value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Opaque(Blob),
    Array(Vec<Value>),
    Object(Map),
    Document(Document),
}

impl Value {
    /// String or number: the values encryption accepts
    pub fn is_plaintext(&self) -> bool {
        matches!(self, Value::String(_) | Value::Number(_))
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Document(_))
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Value::Opaque(blob) => Some(blob),
            _ => None,
        }
    }

    /// Looks up a field of an object or sub-document
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Document(doc) => doc.fields().get(key),
            _ => None,
        }
    }

    /// Returns the type name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Opaque(_) => "opaque",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Document(_) => "document",
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => match encrypted_binary(&map) {
                Some(blob) => Value::Opaque(blob),
                None => Value::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, Value::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

/// Recognises `{"$binary": {"base64": ..., "subType": "06"}}`
fn encrypted_binary(map: &serde_json::Map<String, serde_json::Value>) -> Option<Blob> {
    if map.len() != 1 {
        return None;
    }
    let binary = map.get(BINARY_KEY)?.as_object()?;
    if binary.get("subType")?.as_str()? != ENCRYPTED_SUBTYPE {
        return None;
    }
    Blob::from_base64(binary.get("base64")?.as_str()?)
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Opaque(blob) => json!({
                "$binary": { "base64": blob.to_base64(), "subType": ENCRYPTED_SUBTYPE }
            }),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => object_to_json(map),
            Value::Document(doc) => object_to_json(doc.into_fields()),
        }
    }
}

fn object_to_json(map: Map) -> serde_json::Value {
    serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}
