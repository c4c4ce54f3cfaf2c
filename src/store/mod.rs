//! Table Store subsystem for tabula
//!
//! In-memory, snapshot-isolated row storage that the query core reads and
//! mutates through a narrow row/column interface.
//!
//! # Invariants
//!
//! - A query reads exactly one committed snapshot
//! - One writer at a time; staged changes are invisible until commit
//! - Row-ids are stable and never reused within a table
//! - Deleting a row clears every link that pointed at it
//! - Clearing a table invalidates every handle obtained before the clear

mod database;
mod snapshot;
mod table;
mod transaction;
mod value;

pub use database::Database;
pub use snapshot::Snapshot;
pub use table::Table;
pub use transaction::WriteTransaction;
pub use value::{RowId, Value};
