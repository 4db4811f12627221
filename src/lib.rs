//! fieldcrypt - schema-driven field-level encryption
//!
//! A schema marks some scalar fields as sensitive. [`path::PathCompiler`]
//! compiles it once into a [`path::PathSet`] of canonical dotted paths
//! (array positions become `*`), and [`document::DocumentWalker`] applies an
//! asynchronous encrypt or decrypt transform to exactly the leaves whose
//! path is in the set. [`encryption::FieldEncryption`] wires both to a key
//! resolver and a cipher.

pub mod cipher;
pub mod cli;
pub mod document;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod path;
pub mod schema;

pub use error::{CryptError, CryptResult, Severity};
