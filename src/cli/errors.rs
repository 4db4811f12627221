//! CLI error types
//!
//! A `CliError` either stops the command (configuration, data directory,
//! attach) or is written as an error line for a single input document while
//! the batch continues. Schema and encryption failures keep their own
//! `FLE_*` code and severity.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::{CryptError, Severity};
use crate::schema::SchemaError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Errors raised by the `fieldcrypt` binary
#[derive(Debug, Error)]
pub enum CliError {
    /// Config file missing, unreadable, or not valid JSON
    #[error("config {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("data directory {0:?} already has a schema store and key vault")]
    AlreadyInitialized(PathBuf),

    #[error("data directory {0:?} is not initialized, run 'fieldcrypt init' first")]
    NotInitialized(PathBuf),

    /// Schema store could not be loaded or the requested schema is unknown
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Encryption config, attach, or a per-document transform failed
    #[error(transparent)]
    Crypt(#[from] CryptError),

    /// A stdin line is not a JSON document
    #[error("line {line}: not a JSON document: {source}")]
    Input {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    /// A response line could not be encoded
    #[error("failed to encode response: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CliError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config { .. } => "FLE_CLI_CONFIG_ERROR",
            CliError::AlreadyInitialized(_) => "FLE_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "FLE_CLI_NOT_INITIALIZED",
            CliError::Schema(e) => e.code().code(),
            CliError::Crypt(e) => e.code(),
            CliError::Input { .. } => "FLE_CLI_INPUT_ERROR",
            CliError::Io(_) | CliError::Output(_) => "FLE_CLI_IO_ERROR",
        }
    }

    /// Malformed input rejects one line; everything else the CLI raises
    /// itself stops the command.
    pub fn severity(&self) -> Severity {
        match self {
            CliError::Schema(e) => e.severity(),
            CliError::Crypt(e) => e.severity(),
            CliError::Input { .. } => Severity::Reject,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
