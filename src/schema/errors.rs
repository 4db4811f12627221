//! Schema error types
//!
//! Error codes:
//! - FLE_SCHEMA_CYCLE (FATAL)
//! - FLE_UNKNOWN_SCHEMA (FATAL)
//! - FLE_INVALID_SENSITIVE_FIELD (FATAL)
//! - FLE_MALFORMED_SCHEMA (FATAL)
//! - FLE_SCHEMA_IMMUTABLE (REJECT)

use std::fmt;

use crate::error::Severity;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Embedded schema references form a cycle
    FleSchemaCycle,
    /// Embedded reference points at an unregistered schema
    FleUnknownSchema,
    /// `sensitive` declared on a field that can never hold a string or number
    FleInvalidSensitiveField,
    /// Schema file or definition is structurally invalid
    FleMalformedSchema,
    /// Attempt to replace a registered schema version
    FleSchemaImmutable,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::FleSchemaCycle => "FLE_SCHEMA_CYCLE",
            SchemaErrorCode::FleUnknownSchema => "FLE_UNKNOWN_SCHEMA",
            SchemaErrorCode::FleInvalidSensitiveField => "FLE_INVALID_SENSITIVE_FIELD",
            SchemaErrorCode::FleMalformedSchema => "FLE_MALFORMED_SCHEMA",
            SchemaErrorCode::FleSchemaImmutable => "FLE_SCHEMA_IMMUTABLE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::FleSchemaImmutable => Severity::Reject,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    schema_id: Option<String>,
    schema_version: Option<String>,
    /// Canonical path of the offending field, if any
    field: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            schema_id: None,
            schema_version: None,
            field: None,
        }
    }

    /// Create a cycle error from the chain of `id@version` references that closed the loop
    pub fn schema_cycle(chain: &[String]) -> Self {
        Self::new(
            SchemaErrorCode::FleSchemaCycle,
            format!("Embedded schema cycle: {}", chain.join(" -> ")),
        )
    }

    /// Create an unknown schema error
    pub fn unknown_schema(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = schema_id.into();
        let ver = version.into();
        let mut err = Self::new(
            SchemaErrorCode::FleUnknownSchema,
            format!("Schema '{}' version '{}' is not registered", id, ver),
        );
        err.schema_id = Some(id);
        err.schema_version = Some(ver);
        err
    }

    /// Create an invalid sensitive declaration error
    pub fn invalid_sensitive_field(field: impl Into<String>, type_name: &str) -> Self {
        let field = field.into();
        let mut err = Self::new(
            SchemaErrorCode::FleInvalidSensitiveField,
            format!(
                "Field '{}' of type {} cannot be marked sensitive; only string, int, float and any leaves can",
                field, type_name
            ),
        );
        err.field = Some(field);
        err
    }

    /// Create an error for a malformed schema file or definition
    pub fn malformed_schema(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::FleMalformedSchema,
            format!("Malformed schema '{}': {}", source.into(), reason.into()),
        )
    }

    /// Create a schema immutable error
    pub fn schema_immutable(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = schema_id.into();
        let ver = version.into();
        let mut err = Self::new(
            SchemaErrorCode::FleSchemaImmutable,
            format!("Schema '{}' version '{}' is already registered", id, ver),
        );
        err.schema_id = Some(id);
        err.schema_version = Some(ver);
        err
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema ID if applicable
    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    /// Returns the schema version if applicable
    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    /// Returns the offending field path if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::FleSchemaCycle.code(), "FLE_SCHEMA_CYCLE");
        assert_eq!(SchemaErrorCode::FleUnknownSchema.code(), "FLE_UNKNOWN_SCHEMA");
        assert_eq!(
            SchemaErrorCode::FleInvalidSensitiveField.code(),
            "FLE_INVALID_SENSITIVE_FIELD"
        );
        assert_eq!(SchemaErrorCode::FleSchemaImmutable.code(), "FLE_SCHEMA_IMMUTABLE");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaErrorCode::FleSchemaCycle.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::FleSchemaImmutable.severity(), Severity::Reject);
    }

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = SchemaError::schema_cycle(&["node@v1".into(), "leaf@v1".into(), "node@v1".into()]);
        let display = format!("{}", err);
        assert!(display.contains("FATAL"));
        assert!(display.contains("node@v1 -> leaf@v1 -> node@v1"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_sensitive_carries_field() {
        let err = SchemaError::invalid_sensitive_field("author.*.active", "bool");
        assert_eq!(err.field(), Some("author.*.active"));
        assert!(err.message().contains("bool"));
    }
}
