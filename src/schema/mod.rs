//! Schema Resolver subsystem for tabula
//!
//! Maps a table identity and a field name to a column index and a declared
//! column type, and rejects unknown names.
//!
//! # Design Principles
//!
//! - Explicit registry, owned by the database, never global
//! - Column order fixed once a table is registered
//! - Column names are unique per table and may use any script

mod registry;
mod types;

pub use registry::{SchemaRegistry, TableId};
pub use types::{ColumnDef, ColumnType, TableSchema};
