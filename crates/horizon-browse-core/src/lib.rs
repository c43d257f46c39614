//! Core plumbing for Horizon Browse.
//!
//! This crate provides the pieces shared by every browse-list component:
//!
//! - **Signal/Slot System**: Type-safe, synchronous change notification
//! - **Logging**: Tracing targets, span names and a timing guard
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_browse_core::Signal;
//!
//! // Create a signal that notifies which items changed
//! let selection_changed = Signal::<Vec<u64>>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = selection_changed.connect(|items| {
//!     println!("{} items changed", items.len());
//! });
//!
//! // Emit the signal
//! selection_changed.emit(vec![1, 2, 3]);
//!
//! // Disconnect when done
//! selection_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
