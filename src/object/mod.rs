//! Dynamic object subsystem for tabula
//!
//! Schema-less access to rows by field name, for callers that do not have
//! statically typed entity structs.
//!
//! - `Object`: read handle over the committed state
//! - `ObjectMut`: read/write handle inside a write transaction
//! - `List` / `LinkListMut`: link list views
//!
//! All field references are validated through checked row accessors.

mod list;
#[allow(clippy::module_inception)]
mod object;
mod object_mut;

pub use list::List;
pub use object::Object;
pub use object_mut::{LinkListMut, ObjectMut};
