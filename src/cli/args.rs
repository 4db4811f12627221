//! CLI argument definitions using clap
//!
//! Commands:
//! - fieldcrypt init --config <path>
//! - fieldcrypt paths --config <path> --schema <id> [--schema-version <v>]
//! - fieldcrypt encrypt --config <path> --schema <id> [--schema-version <v>]
//! - fieldcrypt decrypt --config <path> --schema <id> [--schema-version <v>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// fieldcrypt - schema-driven field-level encryption for JSON documents
#[derive(Parser, Debug)]
#[command(name = "fieldcrypt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Schema selection shared by the document commands
#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Path to configuration file
    #[arg(long, default_value = "./fieldcrypt.json")]
    pub config: PathBuf,

    /// Schema id
    #[arg(long)]
    pub schema: String,

    /// Schema version
    #[arg(long = "schema-version", default_value = "v1")]
    pub schema_version: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema and key vault directories
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./fieldcrypt.json")]
        config: PathBuf,
    },

    /// Print the compiled path set of a schema
    Paths(SchemaArgs),

    /// Encrypt one JSON document per stdin line
    Encrypt(SchemaArgs),

    /// Decrypt one JSON document per stdin line
    Decrypt(SchemaArgs),
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encrypt() {
        let cli = Cli::try_parse_from([
            "fieldcrypt",
            "encrypt",
            "--schema",
            "blogs",
            "--schema-version",
            "v2",
        ])
        .unwrap();

        match cli.command {
            Command::Encrypt(args) => {
                assert_eq!(args.schema, "blogs");
                assert_eq!(args.schema_version, "v2");
                assert_eq!(args.config, PathBuf::from("./fieldcrypt.json"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schema_version_defaults_to_v1() {
        let cli = Cli::try_parse_from(["fieldcrypt", "paths", "--schema", "notes"]).unwrap();
        match cli.command {
            Command::Paths(args) => assert_eq!(args.schema_version, "v1"),
            other => panic!("unexpected {:?}", other),
        }

        assert!(
            Cli::try_parse_from(["fieldcrypt", "paths", "--schema", "notes", "--version", "v2"])
                .is_err()
        );
    }

    #[test]
    fn test_schema_is_required() {
        assert!(Cli::try_parse_from(["fieldcrypt", "paths"]).is_err());
    }
}
