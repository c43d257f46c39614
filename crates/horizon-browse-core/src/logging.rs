//! Logging facilities for Horizon Browse.
//!
//! Horizon Browse uses the `tracing` crate for instrumentation. The library
//! never installs a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_browse=debug")
//!         .init();
//! }
//! ```
//!
//! The constants in [`targets`] can be used in filter directives to narrow
//! output to a single subsystem.

/// Span names used throughout Horizon Browse for tracing.
pub mod span_names {
    /// Post-relist selection reconciliation.
    pub const RECONCILE: &str = "horizon_browse::reconcile";
    /// Column-set installation.
    pub const INSTALL_COLUMNS: &str = "horizon_browse::install_columns";
    /// Row ordering pass.
    pub const SORT_ROWS: &str = "horizon_browse::sort_rows";
}

/// Target names for log filtering.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_browse_core::signal";
    /// Column registry target.
    pub const COLUMNS: &str = "horizon_browse::columns";
    /// Sort coordinator target.
    pub const SORT: &str = "horizon_browse::sort";
    /// Filter bridge target.
    pub const FILTER: &str = "horizon_browse::filter";
    /// Selection ledger target.
    pub const SELECTION: &str = "horizon_browse::selection";
    /// Persisted settings target.
    pub const SETTINGS: &str = "horizon_browse::settings";
    /// View synchronizer target.
    pub const VIEW: &str = "horizon_browse::view";
    /// Timing spans.
    pub const PERF: &str = "horizon_browse::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_browse::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` macros with the crate-level
/// target filled in.
#[macro_export]
macro_rules! browse_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "horizon_browse", $($arg)*)
    };
}

#[macro_export]
macro_rules! browse_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_browse", $($arg)*)
    };
}

#[macro_export]
macro_rules! browse_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "horizon_browse", $($arg)*)
    };
}
