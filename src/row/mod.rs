//! Row Accessor subsystem for tabula
//!
//! Capability-checked views over a single row. Accessors are created per
//! access, borrow their cells, and cache nothing.
//!
//! # Variants
//!
//! - `CheckedRow`: validates column existence and declared type on every call
//! - `UncheckedRow`: skips validation for already-verified internal paths
//!
//! Both implement `RowAccess` (and `RowAccessMut` over mutable cells).

mod access;
mod checked;
mod unchecked;

pub use access::{RowAccess, RowAccessMut};
pub use checked::CheckedRow;
pub use unchecked::UncheckedRow;
