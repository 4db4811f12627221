//! Schema type definitions
//!
//! Supported types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - any: dynamically typed value
//! - object: nested object with its own field schema
//! - array: homogeneous array with element type
//! - embedded: reference to another registered schema (sub-document)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Dynamically typed; runtime type decides eligibility
    Any,
    /// Nested object with its own field schema
    Object {
        /// Nested field definitions
        fields: BTreeMap<String, FieldDef>,
    },
    /// Homogeneous array with single element type
    Array {
        /// Element type (boxed to allow recursive types)
        element_type: Box<FieldType>,
    },
    /// Sub-document typed by another registered schema
    Embedded {
        schema_id: String,
        schema_version: String,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Any => "any",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
            FieldType::Embedded { .. } => "embedded",
        }
    }

    /// Shorthand for an array of `element`
    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array {
            element_type: Box::new(element),
        }
    }

    /// Shorthand for an embedded schema reference
    pub fn embedded(schema_id: impl Into<String>, schema_version: impl Into<String>) -> Self {
        FieldType::Embedded {
            schema_id: schema_id.into(),
            schema_version: schema_version.into(),
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    #[serde(default)]
    pub required: bool,
    /// Whether the field's leaf values are encrypted at rest.
    ///
    /// On an array this applies to the innermost elements.
    #[serde(default)]
    pub sensitive: bool,
}

impl FieldDef {
    /// Create a field of the given type
    pub fn new(field_type: FieldType, required: bool) -> Self {
        Self {
            field_type,
            required,
            sensitive: false,
        }
    }

    /// Mark this field as sensitive
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn required_string() -> Self {
        Self::new(FieldType::String, true)
    }

    pub fn optional_string() -> Self {
        Self::new(FieldType::String, false)
    }

    pub fn required_int() -> Self {
        Self::new(FieldType::Int, true)
    }

    pub fn optional_int() -> Self {
        Self::new(FieldType::Int, false)
    }

    pub fn optional_float() -> Self {
        Self::new(FieldType::Float, false)
    }

    pub fn optional_bool() -> Self {
        Self::new(FieldType::Bool, false)
    }

    pub fn optional_any() -> Self {
        Self::new(FieldType::Any, false)
    }

    pub fn optional_object(fields: BTreeMap<String, FieldDef>) -> Self {
        Self::new(FieldType::Object { fields }, false)
    }

    pub fn optional_array(element_type: FieldType) -> Self {
        Self::new(FieldType::array_of(element_type), false)
    }

    pub fn optional_embedded(schema_id: impl Into<String>, schema_version: impl Into<String>) -> Self {
        Self::new(FieldType::embedded(schema_id, schema_version), false)
    }
}

/// Complete schema definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema identifier
    pub schema_id: String,
    /// Schema version
    pub schema_version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions
    pub fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    /// Create a new schema
    pub fn new(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        fields: BTreeMap<String, FieldDef>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_version: schema_version.into(),
            description: None,
            fields,
        }
    }

    /// Returns the unique key for this schema (id, version)
    pub fn key(&self) -> (&str, &str) {
        (&self.schema_id, &self.schema_version)
    }

    /// Returns `id@version`, used in diagnostics and cycle chains
    pub fn label(&self) -> String {
        format!("{}@{}", self.schema_id, self.schema_version)
    }

    /// Validates the schema structure itself (not a document).
    ///
    /// Field names become path segments, so they may not be empty,
    /// contain `.`, or equal the wildcard `*`.
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.schema_id.is_empty() {
            return Err("Schema must have a non-empty schema_id".into());
        }
        if self.schema_version.is_empty() {
            return Err("Schema must have a non-empty schema_version".into());
        }
        validate_fields(&self.fields, "")
    }
}

fn validate_fields(fields: &BTreeMap<String, FieldDef>, prefix: &str) -> Result<(), String> {
    for (name, def) in fields {
        if name.is_empty() || name.contains('.') || name == "*" {
            return Err(format!("Invalid field name '{}' under '{}'", name, prefix));
        }
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        validate_type(&def.field_type, &path)?;
    }
    Ok(())
}

fn validate_type(field_type: &FieldType, path: &str) -> Result<(), String> {
    match field_type {
        FieldType::Object { fields } => validate_fields(fields, path),
        FieldType::Array { element_type } => validate_type(element_type, path),
        FieldType::Embedded {
            schema_id,
            schema_version,
        } if schema_id.is_empty() || schema_version.is_empty() => {
            Err(format!("Embedded reference at '{}' needs an id and a version", path))
        }
        _ => Ok(()),
    }
}
