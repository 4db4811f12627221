//! CLI command implementations
//!
//! Every document command follows the same boot sequence:
//! 1. Configuration load and validation
//! 2. Schema load from `<data_dir>/metadata/schemas`
//! 3. Attach (path compilation against the requested schema)
//! 4. Line loop over stdin

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::document::Value;
use crate::encryption::{EncryptionConfig, FieldEncryption, ReadOptions};
use crate::keys::{FileKeyStore, KeyStore};
use crate::schema::SchemaRegistry;

use super::args::{Command, SchemaArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_documents, write_error_to, write_response_to};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Encryption settings
    #[serde(default)]
    pub encryption: EncryptionConfig,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// - `Config` if the file cannot be read or parsed, or `data_dir` is empty
    /// - `Crypt` (`FLE_CONFIGURATION`) if the encryption settings are invalid
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config(path, format!("failed to read: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config(path, format!("invalid JSON: {}", e)))?;

        config.validate(path)?;

        Ok(config)
    }

    fn validate(&self, path: &Path) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config(path, "data_dir must not be empty"));
        }

        self.encryption.validate()?;
        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }
}

/// Which way a document command transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cmd {
        Command::Init { config } => init(&config, &mut out),
        Command::Paths(args) => paths(&args, &mut out),
        Command::Encrypt(args) => transform(&args, Direction::Encrypt, io::stdin().lock(), &mut out),
        Command::Decrypt(args) => transform(&args, Direction::Decrypt, io::stdin().lock(), &mut out),
    }
}

/// Create the schema and key vault directories
pub fn init<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::AlreadyInitialized(data_dir.to_path_buf()));
    }

    fs::create_dir_all(data_dir.join("metadata").join("schemas"))?;
    fs::create_dir_all(data_dir.join("keyvault"))?;

    write_response_to(out, json!({"initialized": true}))
}

/// Print the compiled path set of a schema
pub fn paths<W: Write>(args: &SchemaArgs, out: &mut W) -> CliResult<()> {
    let config = Config::load(&args.config)?;
    let encryption = attach(&config, args)?;

    write_response_to(
        out,
        json!({
            "schema": encryption.schema(),
            "paths": encryption.paths().to_strings(),
        }),
    )
}

/// Encrypt or decrypt documents read from `input`, one per line
pub fn transform<R: BufRead, W: Write>(
    args: &SchemaArgs,
    direction: Direction,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    let config = Config::load(&args.config)?;
    let encryption = attach(&config, args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let summary = runtime.block_on(process_documents(&encryption, direction, input, out))?;

    tracing::info!(
        event = "CLI_BATCH_COMPLETE",
        schema = %encryption.schema(),
        processed = summary.processed,
        rejected = summary.rejected,
    );
    Ok(())
}

/// Counts of one stdin batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub rejected: usize,
}

/// Transforms each input line and writes one response line per document.
///
/// A line that is not JSON, or a document that fails to transform, is
/// reported and skipped. Unreadable input or unwritable output stops the
/// batch.
pub async fn process_documents<R: BufRead, W: Write>(
    encryption: &FieldEncryption,
    direction: Direction,
    input: R,
    output: &mut W,
) -> CliResult<BatchSummary> {
    let mut summary = BatchSummary::default();

    for line in read_documents(input) {
        let mut doc = match line {
            Ok(json) => Value::from(json),
            Err(e @ CliError::Input { .. }) => {
                write_error_to(output, &e)?;
                summary.rejected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let result = match direction {
            Direction::Encrypt => encryption.encrypt_document(&mut doc).await,
            Direction::Decrypt => {
                encryption
                    .decrypt_document(&mut doc, ReadOptions::default())
                    .await
            }
        };

        match result {
            Ok(_) => {
                write_response_to(output, serde_json::Value::from(doc))?;
                summary.processed += 1;
            }
            Err(e) => {
                write_error_to(output, &CliError::from(e))?;
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}

fn attach(config: &Config, args: &SchemaArgs) -> CliResult<FieldEncryption> {
    let data_dir = config.data_path();
    if !is_initialized(data_dir) {
        return Err(CliError::NotInitialized(data_dir.to_path_buf()));
    }

    let mut registry = SchemaRegistry::new(data_dir);
    registry.load_all()?;
    let schema = registry.resolve(&args.schema, &args.schema_version)?;

    let store: Arc<dyn KeyStore> = Arc::new(FileKeyStore::new(data_dir));
    Ok(FieldEncryption::local(schema, &registry, &config.encryption, store)?)
}

/// Check if a data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("metadata").join("schemas").exists() && data_dir.join("keyvault").exists()
}
