//! Item identity and the external collaborators that own items.
//!
//! A browse list never owns the domain objects it shows. It stores only
//! [`ItemId`]s and state derived from them, and asks the collaborators below
//! for everything else.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// Opaque, stable identifier of a domain object shown as a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identifies the "shape" of an item collection, typically the object class
/// the items belong to.
///
/// When the token changes between two lists, ledger entries recorded against
/// the old list are carried over through relatives rather than by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceToken(pub u32);

impl fmt::Display for SourceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.0)
    }
}

/// Supplies the current ordered item collection of a browse list.
pub trait ItemSource: Send + Sync {
    /// The items of the current collection, in source order.
    fn current_items(&self) -> Vec<ItemId>;

    /// The shape of the current collection.
    fn list_source_token(&self) -> SourceToken;

    /// Maps items of a previous collection to their relatives in the current
    /// one.
    ///
    /// Items without relatives are simply absent from the result. Only called
    /// when the source token changed since the items were recorded.
    fn map_to_relatives(&self, items: &HashSet<ItemId>) -> HashMap<ItemId, Vec<ItemId>>;

    /// Rebuilds the collection for a new filter. The default does nothing,
    /// for sources that filter elsewhere.
    fn apply_filter(&self, _filter: Option<&Filter>) {}
}

/// The backing object repository.
pub trait Repository: Send + Sync {
    /// Whether the object still exists (deleted objects cannot be reconciled).
    fn exists(&self, item: ItemId) -> bool;
}

impl<F> Repository for F
where
    F: Fn(ItemId) -> bool + Send + Sync,
{
    fn exists(&self, item: ItemId) -> bool {
        self(item)
    }
}
