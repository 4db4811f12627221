//! Path compiler
//!
//! Walks a schema once and emits the canonical path of every sensitive
//! leaf:
//! - object children extend the prefix with their field name
//! - arrays add one wildcard segment per nesting level
//! - embedded schemas are resolved through the registry and walked in place
//! - non-sensitive fields emit nothing but are still traversed
//!
//! Compilation is pure and synchronous. The output depends on schema
//! structure only, never on document data.

use std::collections::BTreeMap;

use super::canonical::CanonicalPath;
use super::set::{LeafKind, PathSet};
use crate::schema::{FieldDef, FieldType, Schema, SchemaError, SchemaRegistry, SchemaResult};

/// Compiles schemas into path sets, resolving embedded references
/// against a registry.
pub struct PathCompiler<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> PathCompiler<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Compiles `schema` into its path set.
    ///
    /// # Errors
    ///
    /// - `FLE_SCHEMA_CYCLE` if embedded references loop back on themselves
    /// - `FLE_UNKNOWN_SCHEMA` if an embedded reference is not registered
    /// - `FLE_INVALID_SENSITIVE_FIELD` if `sensitive` is declared on a
    ///   bool, object, or embedded field
    pub fn compile(&self, schema: &Schema) -> SchemaResult<PathSet> {
        let mut paths = PathSet::new();
        let mut active = vec![schema.label()];

        self.compile_fields(&schema.fields, &CanonicalPath::root(), &mut active, &mut paths)?;

        Ok(paths)
    }

    fn compile_fields(
        &self,
        fields: &BTreeMap<String, FieldDef>,
        prefix: &CanonicalPath,
        active: &mut Vec<String>,
        out: &mut PathSet,
    ) -> SchemaResult<()> {
        for (name, def) in fields {
            self.compile_type(&def.field_type, def.sensitive, prefix.field(name), active, out)?;
        }
        Ok(())
    }

    fn compile_type(
        &self,
        field_type: &FieldType,
        sensitive: bool,
        path: CanonicalPath,
        active: &mut Vec<String>,
        out: &mut PathSet,
    ) -> SchemaResult<()> {
        let leaf = match field_type {
            FieldType::String => Some(LeafKind::String),
            FieldType::Int | FieldType::Float => Some(LeafKind::Number),
            FieldType::Any => Some(LeafKind::Any),
            FieldType::Bool => None,
            FieldType::Array { element_type } => {
                return self.compile_type(element_type, sensitive, path.wildcard(), active, out);
            }
            FieldType::Object { fields } => {
                if sensitive {
                    return Err(SchemaError::invalid_sensitive_field(path.to_string(), "object"));
                }
                return self.compile_fields(fields, &path, active, out);
            }
            FieldType::Embedded {
                schema_id,
                schema_version,
            } => {
                if sensitive {
                    return Err(SchemaError::invalid_sensitive_field(path.to_string(), "embedded"));
                }
                return self.compile_embedded(schema_id, schema_version, &path, active, out);
            }
        };

        match (sensitive, leaf) {
            (true, Some(kind)) => out.insert(path, kind),
            (true, None) => {
                return Err(SchemaError::invalid_sensitive_field(
                    path.to_string(),
                    field_type.type_name(),
                ))
            }
            (false, _) => {}
        }
        Ok(())
    }

    fn compile_embedded(
        &self,
        schema_id: &str,
        schema_version: &str,
        path: &CanonicalPath,
        active: &mut Vec<String>,
        out: &mut PathSet,
    ) -> SchemaResult<()> {
        let embedded = self.registry.resolve(schema_id, schema_version)?;
        let label = embedded.label();

        if active.contains(&label) {
            let mut chain = active.clone();
            chain.push(label);
            return Err(SchemaError::schema_cycle(&chain));
        }

        active.push(label);
        self.compile_fields(&embedded.fields, path, active, out)?;
        active.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: Vec<(&str, FieldDef)>) -> BTreeMap<String, FieldDef> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn blog_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::in_memory();
        registry
            .register(Schema::new(
                "tmp",
                "v1",
                fields(vec![("test", FieldDef::optional_string().sensitive())]),
            ))
            .unwrap();
        registry
            .register(Schema::new(
                "authors",
                "v1",
                fields(vec![
                    ("firstName", FieldDef::optional_string().sensitive()),
                    ("lastName", FieldDef::optional_string().sensitive()),
                    ("tmp", FieldDef::optional_embedded("tmp", "v1")),
                ]),
            ))
            .unwrap();
        registry
    }

    fn blog_schema() -> Schema {
        Schema::new(
            "blogs",
            "v1",
            fields(vec![
                ("title", FieldDef::optional_string().sensitive()),
                ("body", FieldDef::optional_string().sensitive()),
                ("date", FieldDef::optional_int()),
                (
                    "author",
                    FieldDef::optional_array(FieldType::embedded("authors", "v1")),
                ),
                ("trash", FieldDef::optional_array(FieldType::Any).sensitive()),
            ]),
        )
    }

    #[test]
    fn test_blog_paths() {
        let registry = blog_registry();
        let paths = PathCompiler::new(&registry).compile(&blog_schema()).unwrap();

        assert_eq!(
            paths.to_strings(),
            vec![
                "author.*.firstName",
                "author.*.lastName",
                "author.*.tmp.test",
                "body",
                "title",
                "trash.*",
            ]
        );
        assert_eq!(paths.kind(&"trash.*".parse().unwrap()), Some(LeafKind::Any));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let registry = blog_registry();
        let compiler = PathCompiler::new(&registry);
        let first = compiler.compile(&blog_schema()).unwrap();
        for _ in 0..10 {
            assert_eq!(compiler.compile(&blog_schema()).unwrap(), first);
        }
    }

    #[test]
    fn test_nested_object_without_arrays() {
        let registry = SchemaRegistry::in_memory();
        let address = fields(vec![
            ("city", FieldDef::optional_string()),
            ("zip", FieldDef::optional_string().sensitive()),
        ]);
        let schema = Schema::new(
            "users",
            "v1",
            fields(vec![("address", FieldDef::optional_object(address))]),
        );

        let paths = PathCompiler::new(&registry).compile(&schema).unwrap();
        assert_eq!(paths.to_strings(), vec!["address.zip"]);
    }

    #[test]
    fn test_array_of_arrays() {
        let registry = SchemaRegistry::in_memory();
        let cell = fields(vec![("value", FieldDef::optional_float().sensitive())]);
        let schema = Schema::new(
            "grids",
            "v1",
            fields(vec![
                (
                    "grid",
                    FieldDef::optional_array(FieldType::array_of(FieldType::Int)).sensitive(),
                ),
                (
                    "cells",
                    FieldDef::optional_array(FieldType::array_of(FieldType::Object { fields: cell })),
                ),
            ]),
        );

        let paths = PathCompiler::new(&registry).compile(&schema).unwrap();
        assert_eq!(paths.to_strings(), vec!["cells.*.*.value", "grid.*.*"]);
    }

    #[test]
    fn test_any_requires_declaration() {
        let registry = SchemaRegistry::in_memory();
        let schema = Schema::new(
            "misc",
            "v1",
            fields(vec![("extra", FieldDef::optional_any())]),
        );
        assert!(PathCompiler::new(&registry).compile(&schema).unwrap().is_empty());
    }

    #[test]
    fn test_sensitive_bool_rejected() {
        let registry = SchemaRegistry::in_memory();
        let schema = Schema::new(
            "flags",
            "v1",
            fields(vec![("active", FieldDef::optional_bool().sensitive())]),
        );
        let err = PathCompiler::new(&registry).compile(&schema).unwrap_err();
        assert_eq!(err.code().code(), "FLE_INVALID_SENSITIVE_FIELD");
        assert_eq!(err.field(), Some("active"));
    }

    #[test]
    fn test_sensitive_array_of_objects_rejected() {
        let registry = SchemaRegistry::in_memory();
        let inner = fields(vec![("x", FieldDef::optional_string())]);
        let schema = Schema::new(
            "bad",
            "v1",
            fields(vec![(
                "items",
                FieldDef::optional_array(FieldType::Object { fields: inner }).sensitive(),
            )]),
        );
        let err = PathCompiler::new(&registry).compile(&schema).unwrap_err();
        assert_eq!(err.field(), Some("items.*"));
    }

    #[test]
    fn test_cycle_detected() {
        let mut registry = SchemaRegistry::in_memory();
        registry
            .register(Schema::new(
                "comment",
                "v1",
                fields(vec![
                    ("text", FieldDef::optional_string().sensitive()),
                    (
                        "replies",
                        FieldDef::optional_array(FieldType::embedded("comment", "v1")),
                    ),
                ]),
            ))
            .unwrap();

        let root = registry.resolve("comment", "v1").unwrap().clone();
        let err = PathCompiler::new(&registry).compile(&root).unwrap_err();
        assert_eq!(err.code().code(), "FLE_SCHEMA_CYCLE");
        assert!(err.message().contains("comment@v1 -> comment@v1"));
    }

    #[test]
    fn test_sibling_reuse_is_not_a_cycle() {
        let registry = blog_registry();
        let schema = Schema::new(
            "pair",
            "v1",
            fields(vec![
                ("left", FieldDef::optional_embedded("tmp", "v1")),
                ("right", FieldDef::optional_embedded("tmp", "v1")),
            ]),
        );
        let paths = PathCompiler::new(&registry).compile(&schema).unwrap();
        assert_eq!(paths.to_strings(), vec!["left.test", "right.test"]);
    }

    #[test]
    fn test_unknown_embedded_schema() {
        let registry = SchemaRegistry::in_memory();
        let schema = Schema::new(
            "orphans",
            "v1",
            fields(vec![("parent", FieldDef::optional_embedded("missing", "v9"))]),
        );
        let err = PathCompiler::new(&registry).compile(&schema).unwrap_err();
        assert_eq!(err.code().code(), "FLE_UNKNOWN_SCHEMA");
    }
}
