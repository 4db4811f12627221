//! Schema subsystem
//!
//! Schemas declare document structure and mark which scalar leaves are
//! sensitive. They are the input to the path compiler and are never
//! consulted while walking documents.
//!
//! # Design Principles
//!
//! - Schemas are immutable once registered
//! - Embedded sub-schemas are referenced by (id, version), not inlined
//! - Field names are path segments and may not contain `.` or be `*`

mod errors;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use registry::SchemaRegistry;
pub use types::{FieldDef, FieldType, Schema};
