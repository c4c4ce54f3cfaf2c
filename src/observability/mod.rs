//! Observability subsystem for tabula
//!
//! - Structured logging (JSON lines)
//! - Monotonic query and transaction counters
//!
//! Observability is read-only: it never changes the outcome of the
//! operation it reports on.

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, QueryMetrics};
