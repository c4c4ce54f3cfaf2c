//! tabula - Query construction and row evaluation core of an embedded object database
//!
//! Fluent predicate building, snapshot evaluation, multi-key sorting and
//! schema-less object access over an in-memory table store.

pub mod config;
pub mod errors;
pub mod object;
pub mod observability;
pub mod query;
pub mod row;
pub mod schema;
pub mod store;

pub use config::{ConfigError, DatabaseConfig};
pub use errors::{DbError, DbResult, ErrorCode};
pub use object::{LinkListMut, List, Object, ObjectMut};
pub use query::{Case, Query, Results, SortDescriptor, SortDirection};
pub use schema::{ColumnDef, ColumnType, SchemaRegistry, TableId, TableSchema};
pub use store::{Database, RowId, Snapshot, Value, WriteTransaction};
