//! # Field Encryption
//!
//! Entry points for encrypting and decrypting documents of a schema.

mod config;
mod plugin;

pub use config::EncryptionConfig;
pub use plugin::{FieldEncryption, FieldEncryptionBuilder, ReadOptions};
