//! CLI module for fieldcrypt
//!
//! Provides command-line interface for:
//! - init: Create directory structure
//! - paths: Show the compiled path set of a schema
//! - encrypt / decrypt: Transform JSON documents read from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SchemaArgs};
pub use commands::{init, paths, process_documents, run, run_command, transform, BatchSummary, Config, Direction};
pub use errors::{CliError, CliResult};
pub use io::{read_documents, write_error_to, write_response_to};
