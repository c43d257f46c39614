//! Horizon Browse - coordination for configurable browse lists.
//!
//! A browse list is a tabular view of a changing item collection whose
//! columns, sort order, filter and per-item check boxes can all change
//! independently. This crate keeps those pieces consistent:
//!
//! - [`column`]: the ordered set of showing columns, with persisted widths
//! - [`sort`]: single and composite sorters, degraded rather than failed
//! - [`filter`]: the filter bar bridge and its re-entrancy guard
//! - [`selection`]: check-box choices that survive relisting
//! - [`view`]: [`BrowseList`], which sequences all of the above
//!
//! Items are opaque [`ItemId`]s. The item collection, the object repository
//! and the key-value store are collaborators supplied by the host through
//! the traits in [`item`] and [`settings`].
//!
//! # Example
//!
//! ```
//! use std::collections::{HashMap, HashSet};
//! use std::sync::Arc;
//!
//! use horizon_browse::{BrowseList, BrowseOptions, ColumnSpec, ItemId, ItemSource, SourceToken};
//!
//! struct Numbers;
//!
//! impl ItemSource for Numbers {
//!     fn current_items(&self) -> Vec<ItemId> {
//!         vec![ItemId(3), ItemId(1), ItemId(2)]
//!     }
//!     fn list_source_token(&self) -> SourceToken {
//!         SourceToken(0)
//!     }
//!     fn map_to_relatives(&self, _: &HashSet<ItemId>) -> HashMap<ItemId, Vec<ItemId>> {
//!         HashMap::new()
//!     }
//! }
//!
//! let catalog = vec![ColumnSpec::new("n", "Number").with_sort_key(|i| i.0.to_string())];
//! let mut list = BrowseList::builder(BrowseOptions::new("numbers"), catalog, Arc::new(Numbers))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(list.rows(), &[ItemId(1), ItemId(2), ItemId(3)]);
//! list.click_column(0, false).unwrap();
//! assert_eq!(list.rows(), &[ItemId(3), ItemId(2), ItemId(1)]);
//! ```

pub mod column;
pub mod error;
pub mod filter;
pub mod item;
pub mod options;
pub mod selection;
pub mod selection_cache;
pub mod settings;
pub mod sort;
pub mod view;

pub use horizon_browse_core::{ConnectionGuard, ConnectionId, PerfSpan, Signal};

pub use column::{
    ColumnId, ColumnInstall, ColumnRegistry, ColumnSpec, ColumnToggle, DeclaredWidth,
    MINIMUM_COLUMN_WIDTH,
};
pub use error::{BrowseError, Result, SettingsError};
pub use filter::{CellFilter, Filter, FilterBridge, FilterCompatibility, FilterGate, MatchingColumn};
pub use item::{ItemId, ItemSource, Repository, SourceToken};
pub use options::BrowseOptions;
pub use selection::{CheckStates, ResetMode, SelectionLedger};
pub use selection_cache::{SavedSelection, SelectionCache};
pub use settings::{PersistedStore, Settings, SettingsFormat};
pub use sort::{CompareMode, IndicatorSize, LeafSorter, SortCoordinator, SortIndicator, SortOrder, Sorter};
pub use view::{BrowseList, BrowseListBuilder};
