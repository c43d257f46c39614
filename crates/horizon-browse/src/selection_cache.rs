//! Session-owned cache of selection ledgers.
//!
//! A browse view saves its ledger here when it is torn down and takes it back
//! when a view with the same identity and root object is built again, so
//! check-box choices survive switching between tools.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::item::{ItemId, SourceToken};

/// The ledger entries of a torn-down view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSelection {
    /// Explicitly selected items.
    pub selected: HashMap<ItemId, SourceToken>,
    /// Explicitly unselected items.
    pub unselected: HashMap<ItemId, SourceToken>,
    /// Shape of the list the entries were last synced with.
    pub token: Option<SourceToken>,
}

impl SavedSelection {
    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.unselected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    view_id: String,
    root: Option<ItemId>,
}

/// Saved selections keyed by view identity and root object.
#[derive(Debug, Default)]
pub struct SelectionCache {
    entries: Mutex<HashMap<CacheKey, SavedSelection>>,
}

impl SelectionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `saved`, replacing any earlier entry for the same key.
    pub fn save(&self, view_id: &str, root: Option<ItemId>, saved: SavedSelection) {
        tracing::trace!(
            target: horizon_browse_core::logging::targets::SELECTION,
            view = view_id,
            selected = saved.selected.len(),
            "selection cached"
        );
        self.entries.lock().insert(
            CacheKey {
                view_id: view_id.to_string(),
                root,
            },
            saved,
        );
    }

    /// Takes the entry for the key out of the cache.
    pub fn load(&self, view_id: &str, root: Option<ItemId>) -> Option<SavedSelection> {
        self.entries.lock().remove(&CacheKey {
            view_id: view_id.to_string(),
            root,
        })
    }

    /// Whether an entry exists for the key.
    pub fn contains(&self, view_id: &str, root: Option<ItemId>) -> bool {
        self.entries.lock().contains_key(&CacheKey {
            view_id: view_id.to_string(),
            root,
        })
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

static_assertions::assert_impl_all!(SelectionCache: Send, Sync);
