//! Check-box selection that survives relisting.
//!
//! The [`SelectionLedger`] remembers explicit check-box choices in two
//! mutually exclusive maps, `selected` and `unselected`, each entry stamped
//! with the [`SourceToken`] it was last validated against. When the item list
//! is replaced the ledger:
//!
//! 1. prunes entries for deleted items and entries whose expectation no
//!    longer matches the item's check state,
//! 2. carries entries over to relatives if the list changed shape,
//!    converting unselected entries first and selected entries second, so
//!    that "selected" wins every conflict,
//! 3. restores check states on the new items, falling back to the view's
//!    default for items without an entry.
//!
//! # Example
//!
//! ```
//! use horizon_browse::item::{ItemId, SourceToken};
//! use horizon_browse::selection::SelectionLedger;
//!
//! let mut ledger = SelectionLedger::new(false, SourceToken(1));
//! assert!(!ledger.is_checked(ItemId(7)));
//!
//! ledger.toggle(ItemId(7));
//! assert!(ledger.is_checked(ItemId(7)));
//! assert!(ledger.is_selected(ItemId(7)));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use horizon_browse_core::logging::{span_names, targets};
use horizon_browse_core::{PerfSpan, Signal};

use crate::item::{ItemId, ItemSource, Repository, SourceToken};
use crate::selection_cache::SavedSelection;

/// Bulk check-box operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Check every current item.
    CheckAll,
    /// Uncheck every current item.
    UncheckAll,
    /// Flip every current item.
    ToggleAll,
}

/// Per-item check states with a default for items never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckStates {
    explicit: HashMap<ItemId, bool>,
    default_checked: bool,
}

impl CheckStates {
    /// Creates an empty cache.
    pub fn new(default_checked: bool) -> Self {
        Self {
            explicit: HashMap::new(),
            default_checked,
        }
    }

    /// The state of items that were never set.
    pub fn default_checked(&self) -> bool {
        self.default_checked
    }

    /// The effective state of `item`.
    pub fn is_checked(&self, item: ItemId) -> bool {
        self.explicit
            .get(&item)
            .copied()
            .unwrap_or(self.default_checked)
    }

    /// The explicitly set state of `item`.
    pub fn explicit(&self, item: ItemId) -> Option<bool> {
        self.explicit.get(&item).copied()
    }

    /// Sets the state of `item`.
    pub fn set(&mut self, item: ItemId, checked: bool) {
        self.explicit.insert(item, checked);
    }

    /// Returns `item` to the default state.
    pub fn clear(&mut self, item: ItemId) {
        self.explicit.remove(&item);
    }
}

/// Why a ledger entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PruneReason {
    /// The object no longer exists.
    Deleted,
    /// The item's check state no longer matches the entry.
    StaleExpectation,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneReason::Deleted => f.write_str("deleted"),
            PruneReason::StaleExpectation => f.write_str("stale expectation"),
        }
    }
}

fn prune_reason(
    repository: &dyn Repository,
    checks: &CheckStates,
    item: ItemId,
    expect_checked: bool,
) -> Option<PruneReason> {
    if !repository.exists(item) {
        Some(PruneReason::Deleted)
    } else if checks.is_checked(item) != expect_checked {
        Some(PruneReason::StaleExpectation)
    } else {
        None
    }
}

/// Tracks explicit check-box choices across list replacement.
pub struct SelectionLedger {
    selected: HashMap<ItemId, SourceToken>,
    unselected: HashMap<ItemId, SourceToken>,
    checks: CheckStates,
    /// Items of the current list, in source order.
    items: Vec<ItemId>,
    /// Token of the list the ledger was last synced with.
    token: SourceToken,
    selection_changed: Signal<Vec<ItemId>>,
}

impl fmt::Debug for SelectionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionLedger")
            .field("selected", &self.selected.len())
            .field("unselected", &self.unselected.len())
            .field("items", &self.items.len())
            .field("token", &self.token)
            .finish()
    }
}

impl SelectionLedger {
    /// Creates an empty ledger for a list of shape `token`.
    pub fn new(default_checked: bool, token: SourceToken) -> Self {
        Self {
            selected: HashMap::new(),
            unselected: HashMap::new(),
            checks: CheckStates::new(default_checked),
            items: Vec::new(),
            token,
            selection_changed: Signal::new(),
        }
    }

    /// Recreates a ledger from a saved snapshot.
    ///
    /// Check states are seeded from the entries, so the next relist restores
    /// rather than prunes them.
    pub fn from_saved(saved: SavedSelection, default_checked: bool, token: SourceToken) -> Self {
        let mut ledger = Self::new(default_checked, saved.token.unwrap_or(token));
        for (&item, &stamp) in &saved.unselected {
            ledger.checks.set(item, false);
            ledger.mark(item, false, stamp);
        }
        for (&item, &stamp) in &saved.selected {
            ledger.checks.set(item, true);
            ledger.mark(item, true, stamp);
        }
        ledger
    }

    /// A snapshot of the ledger entries, for a [`SelectionCache`](crate::selection_cache::SelectionCache).
    pub fn snapshot(&self) -> SavedSelection {
        SavedSelection {
            selected: self.selected.clone(),
            unselected: self.unselected.clone(),
            token: Some(self.token),
        }
    }

    /// Signal emitted with the items whose check state changed.
    pub fn selection_changed(&self) -> &Signal<Vec<ItemId>> {
        &self.selection_changed
    }

    /// The shape of the list the ledger was last synced with.
    pub fn token(&self) -> SourceToken {
        self.token
    }

    /// Items of the current list.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// The check-state cache.
    pub fn check_states(&self) -> &CheckStates {
        &self.checks
    }

    /// Whether `item` is checked.
    pub fn is_checked(&self, item: ItemId) -> bool {
        self.checks.is_checked(item)
    }

    /// Whether the ledger records `item` as explicitly selected.
    pub fn is_selected(&self, item: ItemId) -> bool {
        self.selected.contains_key(&item)
    }

    /// Whether the ledger records `item` as explicitly unselected.
    pub fn is_unselected(&self, item: ItemId) -> bool {
        self.unselected.contains_key(&item)
    }

    /// The token `item`'s entry was last validated against.
    pub fn entry_token(&self, item: ItemId) -> Option<SourceToken> {
        self.selected
            .get(&item)
            .or_else(|| self.unselected.get(&item))
            .copied()
    }

    /// Explicitly selected items, sorted.
    pub fn selected_items(&self) -> Vec<ItemId> {
        sorted_keys(&self.selected)
    }

    /// Explicitly unselected items, sorted.
    pub fn unselected_items(&self) -> Vec<ItemId> {
        sorted_keys(&self.unselected)
    }

    /// Checked items of the current list, in list order.
    pub fn checked_items(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .copied()
            .filter(|&item| self.checks.is_checked(item))
            .collect()
    }

    // =========================================================================
    // List replacement
    // =========================================================================

    /// Records the check state of every item in `current_items`.
    pub fn before_list_replaced(&mut self, current_items: &[ItemId]) {
        for &item in current_items {
            let checked = self.checks.is_checked(item);
            self.mark(item, checked, self.token);
        }
        tracing::trace!(
            target: targets::SELECTION,
            selected = self.selected.len(),
            unselected = self.unselected.len(),
            "selection saved"
        );
    }

    /// Reconciles the ledger with the list `source` now supplies.
    ///
    /// Emits `selection_changed` once if any current item changed state, and
    /// returns those items.
    pub fn after_list_replaced(
        &mut self,
        source: &dyn ItemSource,
        repository: &dyn Repository,
    ) -> Vec<ItemId> {
        let _perf = PerfSpan::new(span_names::RECONCILE);

        self.prune(repository);

        let token = source.list_source_token();
        if token != self.token {
            tracing::debug!(
                target: targets::SELECTION,
                from = %self.token,
                to = %token,
                "list changed shape, mapping selection to relatives"
            );
            self.convert_to_relatives(source, token);
            self.token = token;
        }

        self.items = source.current_items();
        let mut changed = Vec::new();
        for &item in &self.items {
            let before = self.checks.is_checked(item);
            if self.selected.contains_key(&item) {
                self.checks.set(item, true);
            } else if self.unselected.contains_key(&item) {
                self.checks.set(item, false);
            } else {
                self.checks.clear(item);
            }
            if self.checks.is_checked(item) != before {
                changed.push(item);
            }
        }

        self.emit_changed(&changed);
        changed
    }

    // =========================================================================
    // Direct mutation
    // =========================================================================

    /// Records a check state changed outside the ledger, such as by a host
    /// model between [`before_list_replaced`](Self::before_list_replaced) and
    /// [`after_list_replaced`](Self::after_list_replaced).
    ///
    /// Ledger entries are left untouched. An entry the new state contradicts
    /// is dropped as stale by the next reconciliation, and the item falls
    /// back to the default policy. No signal is emitted.
    pub fn record_check_state(&mut self, item: ItemId, checked: bool) {
        self.checks.set(item, checked);
    }

    /// Flips `item` and returns its new state.
    pub fn toggle(&mut self, item: ItemId) -> bool {
        let checked = !self.checks.is_checked(item);
        self.checks.set(item, checked);
        self.mark(item, checked, self.token);
        self.emit_changed(&[item]);
        checked
    }

    /// Sets every item in `items` to `checked`, returning those that changed.
    pub fn set_many(&mut self, items: &[ItemId], checked: bool) -> Vec<ItemId> {
        let mut changed = Vec::new();
        for &item in items {
            if self.checks.is_checked(item) != checked {
                changed.push(item);
            }
            self.checks.set(item, checked);
            self.mark(item, checked, self.token);
        }
        self.emit_changed(&changed);
        changed
    }

    /// Applies a bulk operation to every current item.
    pub fn reset_all(&mut self, mode: ResetMode) -> Vec<ItemId> {
        let items = self.items.clone();
        match mode {
            ResetMode::CheckAll => self.set_many(&items, true),
            ResetMode::UncheckAll => self.set_many(&items, false),
            ResetMode::ToggleAll => {
                for &item in &items {
                    let checked = !self.checks.is_checked(item);
                    self.checks.set(item, checked);
                    self.mark(item, checked, self.token);
                }
                self.emit_changed(&items);
                items
            }
        }
    }

    /// Checks exactly `checked` among the current items.
    pub fn set_checked_items(&mut self, checked: &HashSet<ItemId>) -> Vec<ItemId> {
        let items = self.items.clone();
        let mut changed = Vec::new();
        for item in items {
            let value = checked.contains(&item);
            if self.checks.is_checked(item) != value {
                changed.push(item);
            }
            self.checks.set(item, value);
            self.mark(item, value, self.token);
        }
        self.emit_changed(&changed);
        changed
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Records `item` in exactly one of the two maps.
    fn mark(&mut self, item: ItemId, checked: bool, token: SourceToken) {
        if checked {
            self.unselected.remove(&item);
            self.selected.insert(item, token);
        } else {
            self.selected.remove(&item);
            self.unselected.insert(item, token);
        }
    }

    fn prune(&mut self, repository: &dyn Repository) {
        let checks = &self.checks;
        self.selected.retain(|&item, _| match prune_reason(repository, checks, item, true) {
            Some(reason) => {
                tracing::debug!(target: targets::SELECTION, item = %item, %reason, "dropping selected entry");
                false
            }
            None => true,
        });
        self.unselected.retain(|&item, _| match prune_reason(repository, checks, item, false) {
            Some(reason) => {
                tracing::debug!(target: targets::SELECTION, item = %item, %reason, "dropping unselected entry");
                false
            }
            None => true,
        });
    }

    /// Replaces every entry by entries for its relatives in the new list.
    ///
    /// Unselected entries convert first and selected second, so a relative
    /// reached from both ends up selected.
    fn convert_to_relatives(&mut self, source: &dyn ItemSource, token: SourceToken) {
        let unselected: HashSet<ItemId> = std::mem::take(&mut self.unselected).into_keys().collect();
        let selected: HashSet<ItemId> = std::mem::take(&mut self.selected).into_keys().collect();

        for (checked, origin) in [(false, unselected), (true, selected)] {
            if origin.is_empty() {
                continue;
            }
            let relatives = source.map_to_relatives(&origin);
            for &relative in relatives.values().flatten() {
                self.checks.set(relative, checked);
                self.mark(relative, checked, token);
            }
        }
    }

    fn emit_changed(&self, changed: &[ItemId]) {
        if !changed.is_empty() {
            self.selection_changed.emit(changed.to_vec());
        }
    }
}

fn sorted_keys(map: &HashMap<ItemId, SourceToken>) -> Vec<ItemId> {
    let mut keys: Vec<ItemId> = map.keys().copied().collect();
    keys.sort_unstable();
    keys
}

static_assertions::assert_impl_all!(SelectionLedger: Send, Sync);
