//! Query subsystem for tabula
//!
//! Builds predicate trees through a fluent API, evaluates them against one
//! committed snapshot and materializes ordered result sets.
//!
//! # Pipeline
//!
//! Builder (field and type validation) -> predicate tree -> Evaluator
//! (row-id set over the domain) -> optional Sort Engine -> Results.
//!
//! Results and link lists re-enter the pipeline through `where_()`, which
//! freezes the evaluation domain to their row-ids.

mod ast;
mod builder;
pub mod compare;
mod evaluator;
mod results;
mod sorter;

pub use ast::{Case, ColumnPath, CompareOp, Comparison, Expr, LinkHop};
pub use builder::Query;
pub use evaluator::{Evaluator, RowSource};
pub use results::Results;
pub use sorter::{SortDescriptor, SortDirection, SortKey};
