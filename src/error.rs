//! Crate-level error type
//!
//! Every failure surfaces to the immediate caller of `encrypt_document` /
//! `decrypt_document`. Configuration and schema errors are FATAL and are
//! raised at attach time, before any document is processed.

use std::fmt;

use thiserror::Error;

use crate::cipher::CipherError;
use crate::keys::KeyError;
use crate::schema::SchemaError;

/// Severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request is rejected; the process keeps running
    Reject,
    /// Misconfiguration; nothing can be processed until it is fixed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for field encryption operations
pub type CryptResult<T> = Result<T, CryptError>;

/// Field encryption errors
#[derive(Debug, Error)]
pub enum CryptError {
    /// Missing or invalid secret, key name, or key vault namespace
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Schema could not be compiled into a path set
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The key resolver could not find or mint the data key
    #[error("failed to resolve data key '{key_name}': {source}")]
    KeyResolution {
        key_name: String,
        #[source]
        source: KeyError,
    },

    /// The cipher failed on a leaf
    #[error("transform failed at '{path}': {source}")]
    Transform {
        path: String,
        #[source]
        source: CipherError,
    },

    /// A container sits where the schema declares a sensitive scalar
    #[error("value at '{path}' is declared {expected} but holds {found}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl CryptError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        CryptError::Configuration(msg.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CryptError::Configuration(_) => "FLE_CONFIGURATION",
            CryptError::Schema(e) => e.code().code(),
            CryptError::KeyResolution { .. } => "FLE_KEY_RESOLUTION",
            CryptError::Transform { .. } => "FLE_TRANSFORM",
            CryptError::ShapeMismatch { .. } => "FLE_SHAPE_MISMATCH",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            CryptError::Configuration(_) => Severity::Fatal,
            CryptError::Schema(e) => e.severity(),
            _ => Severity::Reject,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CryptError::configuration("x").code(), "FLE_CONFIGURATION");
        let err = CryptError::ShapeMismatch {
            path: "title".into(),
            expected: "string",
            found: "object",
        };
        assert_eq!(err.code(), "FLE_SHAPE_MISMATCH");
        assert_eq!(err.to_string(), "value at 'title' is declared string but holds object");
    }

    #[test]
    fn test_schema_errors_keep_their_code() {
        let err: CryptError = SchemaError::schema_cycle(&["a@v1".into(), "a@v1".into()]).into();
        assert_eq!(err.code(), "FLE_SCHEMA_CYCLE");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_transform_errors_reject() {
        let err = CryptError::Transform {
            path: "body".into(),
            source: CipherError::Authentication,
        };
        assert_eq!(err.severity(), Severity::Reject);
        assert!(err.to_string().contains("body"));
    }
}
