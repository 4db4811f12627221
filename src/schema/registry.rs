//! Schema registry
//!
//! - Schemas stored at `<data_dir>/metadata/schemas/schema_<id>_<version>.json`
//! - One file per schema version
//! - Malformed schema files fail the load (FATAL)
//! - Registered versions are immutable

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// In-memory registry of schemas, optionally backed by a directory on disk.
///
/// Embedded schema references are resolved against this registry at
/// compile time.
#[derive(Debug)]
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    schemas: HashMap<(String, String), Schema>,
}

impl SchemaRegistry {
    /// Creates a registry whose schema files live under `<data_dir>/metadata/schemas/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            schema_dir: data_dir.join("metadata").join("schemas"),
            schemas: HashMap::new(),
        }
    }

    /// Creates a registry with no backing directory contents loaded.
    pub fn in_memory() -> Self {
        Self::new(Path::new("."))
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every `.json` file from the schema directory.
    ///
    /// A missing directory is not an error; it simply holds no schemas.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        if !self.schema_dir.exists() {
            return Ok(0);
        }

        let dir = self.schema_dir.display().to_string();
        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_schema(&dir, format!("Failed to read schema directory: {}", e))
        })?;

        let mut loaded = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    SchemaError::malformed_schema(&dir, format!("Failed to read directory entry: {}", e))
                })?
                .path();

            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            let schema = Self::read_schema_file(&path)?;
            self.register(schema)?;
            loaded += 1;
        }

        tracing::debug!(event = "SCHEMAS_LOADED", dir = %dir, count = loaded);
        Ok(loaded)
    }

    fn read_schema_file(path: &Path) -> SchemaResult<Schema> {
        let source = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::malformed_schema(&source, format!("Failed to read file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| SchemaError::malformed_schema(&source, format!("Invalid JSON: {}", e)))
    }

    /// Registers a schema directly.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(schema.label(), e))?;

        let key = (schema.schema_id.clone(), schema.schema_version.clone());
        if self.schemas.contains_key(&key) {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        self.schemas.insert(key, schema);
        Ok(())
    }

    /// Gets a schema by ID and version.
    pub fn get(&self, schema_id: &str, schema_version: &str) -> Option<&Schema> {
        self.schemas
            .get(&(schema_id.to_string(), schema_version.to_string()))
    }

    /// Gets a schema, failing with `FLE_UNKNOWN_SCHEMA` if it is not registered.
    pub fn resolve(&self, schema_id: &str, schema_version: &str) -> SchemaResult<&Schema> {
        self.get(schema_id, schema_version)
            .ok_or_else(|| SchemaError::unknown_schema(schema_id, schema_version))
    }

    /// Returns the number of registered schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Writes a schema file to the schema directory.
    pub fn save_schema(&self, schema: &Schema) -> SchemaResult<PathBuf> {
        let path = self.schema_dir.join(format!(
            "schema_{}_{}.json",
            schema.schema_id, schema.schema_version
        ));
        let target = path.display().to_string();

        if path.exists() {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        fs::create_dir_all(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_schema(&target, format!("Failed to create schema directory: {}", e))
        })?;

        let content = serde_json::to_string_pretty(schema)
            .map_err(|e| SchemaError::malformed_schema(&target, format!("Failed to serialize schema: {}", e)))?;

        fs::write(&path, content)
            .map_err(|e| SchemaError::malformed_schema(&target, format!("Failed to write file: {}", e)))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::FieldDef;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_schema() -> Schema {
        let mut fields = BTreeMap::new();
        fields.insert("title".into(), FieldDef::required_string().sensitive());
        fields.insert("date".into(), FieldDef::optional_int());
        Schema::new("blogs", "v1", fields)
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = SchemaRegistry::in_memory();
        registry.register(sample_schema()).unwrap();

        let schema = registry.resolve("blogs", "v1").unwrap();
        assert_eq!(schema.schema_id, "blogs");
        assert_eq!(registry.schema_count(), 1);
    }

    #[test]
    fn test_schema_immutability() {
        let mut registry = SchemaRegistry::in_memory();
        registry.register(sample_schema()).unwrap();

        let err = registry.register(sample_schema()).unwrap_err();
        assert_eq!(err.code().code(), "FLE_SCHEMA_IMMUTABLE");
    }

    #[test]
    fn test_unknown_schema() {
        let registry = SchemaRegistry::in_memory();
        let err = registry.resolve("nope", "v1").unwrap_err();
        assert_eq!(err.code().code(), "FLE_UNKNOWN_SCHEMA");
        assert_eq!(err.schema_id(), Some("nope"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SchemaRegistry::new(temp_dir.path());
        registry.save_schema(&sample_schema()).unwrap();

        let mut reloaded = SchemaRegistry::new(temp_dir.path());
        assert_eq!(reloaded.load_all().unwrap(), 1);
        assert_eq!(reloaded.get("blogs", "v1"), Some(&sample_schema()));
    }

    #[test]
    fn test_load_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::new(temp_dir.path());
        assert_eq!(registry.load_all().unwrap(), 0);
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SchemaRegistry::new(temp_dir.path());
        fs::create_dir_all(registry.schema_dir()).unwrap();
        fs::write(registry.schema_dir().join("schema_x_v1.json"), "{ not json").unwrap();

        let mut registry = SchemaRegistry::new(temp_dir.path());
        let err = registry.load_all().unwrap_err();
        assert_eq!(err.code().code(), "FLE_MALFORMED_SCHEMA");
        assert!(err.is_fatal());
    }
}
