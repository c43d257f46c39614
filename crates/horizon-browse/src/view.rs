//! The browse list: one view's columns, sorter, filter bar and selection.
//!
//! [`BrowseList`] owns one of each component and sequences them on
//! structural events. It holds no business rules of its own; what it
//! guarantees is ordering:
//!
//! - column changes mutate the registry, then re-derive the sorter, then
//!   refresh the filter bar and the row order;
//! - filter changes go through the filter bridge first, then the item source
//!   relists, then the selection ledger reconciles, then sort indicators are
//!   re-synced;
//! - list replacement is bracketed by the ledger's before/after hooks.
//!
//! # Example
//!
//! ```ignore
//! let mut list = BrowseList::builder(options, catalog, source)
//!     .store(settings.clone())
//!     .selection_cache(cache.clone())
//!     .build()?;
//!
//! list.sorter_changed().connect(|_| println!("resorted"));
//! list.click_column(1, false)?;
//! list.toggle_item(list.rows()[0]);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_browse_core::logging::{span_names, targets};
use horizon_browse_core::{PerfSpan, Signal, browse_debug, browse_warn};

use crate::column::{ColumnId, ColumnInstall, ColumnRegistry, ColumnSpec, ColumnToggle};
use crate::error::Result;
use crate::filter::{FilterBridge, FilterCompatibility, FilterGate, Filter, MatchingColumn};
use crate::item::{ItemId, ItemSource, Repository};
use crate::options::BrowseOptions;
use crate::selection::{ResetMode, SelectionLedger};
use crate::selection_cache::SelectionCache;
use crate::settings::{PersistedStore, Settings};
use crate::sort::{SortCoordinator, Sorter};

/// Persisted key for the active sorter.
pub fn sorter_key(view_id: &str) -> String {
    format!("{view_id}_Sorter")
}

/// A coordinated, sortable, filterable list view with check boxes.
pub struct BrowseList {
    options: BrowseOptions,
    columns: ColumnRegistry,
    sort: SortCoordinator,
    filter: FilterBridge,
    selection: SelectionLedger,
    source: Arc<dyn ItemSource>,
    repository: Arc<dyn Repository>,
    store: Arc<dyn PersistedStore>,
    cache: Option<Arc<SelectionCache>>,
    /// Current items in display order.
    rows: Vec<ItemId>,
}

impl fmt::Debug for BrowseList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowseList")
            .field("options", &self.options)
            .field("columns", &self.columns)
            .field("sort", &self.sort)
            .field("filter", &self.filter)
            .field("selection", &self.selection)
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl BrowseList {
    /// Starts building a browse list over `catalog` and `source`.
    pub fn builder(
        options: BrowseOptions,
        catalog: Vec<ColumnSpec>,
        source: Arc<dyn ItemSource>,
    ) -> BrowseListBuilder {
        BrowseListBuilder::new(options, catalog, source)
    }

    // =========================================================================
    // Components and events
    // =========================================================================

    /// The view configuration.
    pub fn options(&self) -> &BrowseOptions {
        &self.options
    }

    /// The column registry.
    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    /// The sort coordinator.
    pub fn sort(&self) -> &SortCoordinator {
        &self.sort
    }

    /// The filter bridge.
    pub fn filter(&self) -> &FilterBridge {
        &self.filter
    }

    /// The selection ledger.
    pub fn selection(&self) -> &SelectionLedger {
        &self.selection
    }

    /// The re-entrancy guard a filter bar should share.
    pub fn filter_gate(&self) -> FilterGate {
        self.filter.gate().clone()
    }

    /// Current items in display order.
    pub fn rows(&self) -> &[ItemId] {
        &self.rows
    }

    /// Emitted after column changes; `true` when only widths changed.
    pub fn columns_changed(&self) -> &Signal<bool> {
        self.columns.columns_changed()
    }

    /// Emitted when the sorter changes.
    pub fn sorter_changed(&self) -> &Signal<()> {
        self.sort.sorter_changed()
    }

    /// Emitted with the items whose check state changed.
    pub fn selection_changed(&self) -> &Signal<Vec<ItemId>> {
        self.selection.selection_changed()
    }

    /// Emitted when the filter bar should redisplay a filter.
    pub fn filter_bar_sync_required(&self) -> &Signal<Option<Filter>> {
        self.filter.filter_bar_sync_required()
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Replaces the showing columns with the result of a column chooser.
    pub fn install_columns(&mut self, ids: &[ColumnId]) -> Result<ColumnInstall> {
        let _perf = PerfSpan::new(span_names::INSTALL_COLUMNS);
        let install = self.columns.batch(|columns| columns.install_columns(ids))?;
        if install.removed_any {
            self.rederive_sorter();
        } else if install.order_changed {
            self.sort.sync_indicators(&self.columns);
        }
        self.filter.sync_cells(&self.columns);
        tracing::debug!(target: targets::VIEW, ?install, "columns installed");
        Ok(install)
    }

    /// Shows or hides a catalog column from the header menu.
    pub fn toggle_column(&mut self, id: &ColumnId) -> Result<ColumnToggle> {
        let toggle = self.columns.toggle_column(id)?;
        self.after_column_change();
        Ok(toggle)
    }

    /// Inserts a column at `index` (clamped) and returns where it landed.
    pub fn insert_column(&mut self, spec: ColumnSpec, index: usize) -> usize {
        let index = self.columns.insert_column(spec, index);
        self.after_column_change();
        index
    }

    /// Removes the column at `index`.
    pub fn remove_column(&mut self, index: usize) -> Result<ColumnSpec> {
        let removed = self.columns.remove_column(index)?;
        self.after_column_change();
        Ok(removed)
    }

    /// Applies a drag reorder: new position `i` shows the column that was at
    /// `mapping[i]`.
    pub fn reorder_columns(&mut self, mapping: &[usize]) -> Result<()> {
        self.columns.reorder(mapping)?;
        self.sort.sync_indicators(&self.columns);
        Ok(())
    }

    /// Sets and persists a column width.
    pub fn resize_column(&mut self, index: usize, width: i32) -> Result<()> {
        self.columns.set_persisted_width(index, width)
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Handles a header click; `shift` extends a composite sort.
    pub fn click_column(&mut self, index: usize, shift: bool) -> Result<bool> {
        let sorted = self.sort.click_column(index, shift, &self.columns)?;
        if sorted {
            self.after_sorter_change();
        }
        Ok(sorted)
    }

    /// Flips the from-end comparison on the column at `index`.
    pub fn toggle_sorted_from_end(&mut self, index: usize) -> Result<bool> {
        let toggled = self.sort.toggle_sorted_from_end(index, &self.columns)?;
        if toggled {
            self.after_sorter_change();
        }
        Ok(toggled)
    }

    /// Flips the by-length comparison on the column at `index`.
    pub fn toggle_sorted_by_length(&mut self, index: usize) -> Result<bool> {
        let toggled = self.sort.toggle_sorted_by_length(index, &self.columns)?;
        if toggled {
            self.after_sorter_change();
        }
        Ok(toggled)
    }

    /// Installs a sorter, degrading it to the showing columns.
    pub fn apply_sorter(&mut self, sorter: Option<Sorter>, force_changed: bool) -> bool {
        let changed = self.sort.apply_sorter(sorter, force_changed, &self.columns);
        if changed || force_changed {
            self.after_sorter_change();
        }
        changed
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Shows `filter` in the filter bar, appending matching hidden columns the
    /// first time a filter is installed.
    pub fn update_filter_bar(&mut self, filter: Option<Filter>) -> Vec<ColumnId> {
        let appended = self.filter.update_filter_bar(filter, &mut self.columns);
        if !appended.is_empty() {
            self.rederive_sorter();
        }
        appended
    }

    /// Handles a filter edited in the filter bar.
    ///
    /// Saves the selection, relists through the item source, reconciles the
    /// selection and re-syncs sort indicators. A nested call while another
    /// change is in progress does nothing and returns `false`.
    pub fn filter_changed(&mut self, filter: Option<Filter>) -> bool {
        let Some(_guard) = self.filter.gate().try_enter() else {
            tracing::debug!(target: targets::VIEW, "nested filter change ignored");
            return false;
        };

        self.list_about_to_change();
        self.filter.set_filter(filter, &self.columns);
        self.source.apply_filter(self.filter.filter());
        self.list_changed();
        self.sort.sync_indicators(&self.columns);
        true
    }

    // =========================================================================
    // List replacement
    // =========================================================================

    /// Call before the item source replaces its list.
    pub fn list_about_to_change(&mut self) {
        if self.options.has_select_column {
            let current = self.selection.items().to_vec();
            self.selection.before_list_replaced(&current);
        }
    }

    /// Call after the item source replaced its list.
    pub fn list_changed(&mut self) {
        if self.options.has_select_column {
            self.selection
                .after_list_replaced(self.source.as_ref(), self.repository.as_ref());
        }
        self.rows = self.source.current_items();
        self.sort.sort_items(&mut self.rows, &self.columns);
        browse_debug!(rows = self.rows.len(), "list changed");
    }

    /// Brackets `relist` with [`list_about_to_change`](Self::list_about_to_change)
    /// and [`list_changed`](Self::list_changed).
    pub fn replace_list(&mut self, relist: impl FnOnce(&dyn ItemSource)) {
        self.list_about_to_change();
        relist(self.source.as_ref());
        self.list_changed();
    }

    // =========================================================================
    // Check boxes
    // =========================================================================

    /// Flips an item's check box. `None` when the view has no check boxes.
    pub fn toggle_item(&mut self, item: ItemId) -> Option<bool> {
        self.options
            .has_select_column
            .then(|| self.selection.toggle(item))
    }

    /// Sets the check boxes of `items`, returning those that changed.
    pub fn set_items_checked(&mut self, items: &[ItemId], checked: bool) -> Vec<ItemId> {
        if !self.options.has_select_column {
            return Vec::new();
        }
        self.selection.set_many(items, checked)
    }

    /// Checks, unchecks or flips every current item.
    pub fn reset_all(&mut self, mode: ResetMode) -> Vec<ItemId> {
        if !self.options.has_select_column {
            return Vec::new();
        }
        self.selection.reset_all(mode)
    }

    /// Checks exactly `items` among the current items.
    pub fn set_checked_items(&mut self, items: &HashSet<ItemId>) -> Vec<ItemId> {
        if !self.options.has_select_column {
            return Vec::new();
        }
        self.selection.set_checked_items(items)
    }

    /// Checked items in source order.
    pub fn checked_items(&self) -> Vec<ItemId> {
        if !self.options.has_select_column {
            return Vec::new();
        }
        self.selection.checked_items()
    }

    /// Whether `item` is checked.
    pub fn is_checked(&self, item: ItemId) -> bool {
        self.options.has_select_column && self.selection.is_checked(item)
    }

    /// Records a check state the host changed on its own while a relist is
    /// pending. See [`SelectionLedger::record_check_state`].
    pub fn record_check_state(&mut self, item: ItemId, checked: bool) {
        if self.options.has_select_column {
            self.selection.record_check_state(item, checked);
        }
    }

    /// Stores the selection in the session cache, if one was provided.
    pub fn save_selection(&self) {
        if let Some(cache) = &self.cache
            && self.options.has_select_column
        {
            cache.save(
                &self.options.view_id,
                self.options.root,
                self.selection.snapshot(),
            );
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn after_column_change(&mut self) {
        self.rederive_sorter();
        self.filter.sync_cells(&self.columns);
    }

    /// Re-applies the current sorter against the current columns.
    fn rederive_sorter(&mut self) {
        let current = self.sort.sorter().cloned();
        if self.sort.apply_sorter(current, false, &self.columns) {
            self.after_sorter_change();
        }
    }

    fn after_sorter_change(&mut self) {
        self.persist_sorter();
        self.sort.sort_items(&mut self.rows, &self.columns);
    }

    fn persist_sorter(&self) {
        let key = sorter_key(&self.options.view_id);
        match self.sort.sorter() {
            Some(sorter) => match serde_json::to_string(sorter) {
                Ok(json) => self.store.set_string(&key, &json),
                Err(e) => browse_warn!("cannot encode sorter: {}", e),
            },
            None => self.store.set_string(&key, ""),
        }
    }
}

impl Drop for BrowseList {
    fn drop(&mut self) {
        self.save_selection();
    }
}

/// Builder for [`BrowseList`].
pub struct BrowseListBuilder {
    options: BrowseOptions,
    catalog: Vec<ColumnSpec>,
    source: Arc<dyn ItemSource>,
    repository: Arc<dyn Repository>,
    store: Arc<dyn PersistedStore>,
    compatibility: Arc<dyn FilterCompatibility>,
    cache: Option<Arc<SelectionCache>>,
}

impl BrowseListBuilder {
    /// Creates a builder. Every object exists and settings live in memory
    /// until told otherwise.
    pub fn new(options: BrowseOptions, catalog: Vec<ColumnSpec>, source: Arc<dyn ItemSource>) -> Self {
        Self {
            options,
            catalog,
            source,
            repository: Arc::new(|_: ItemId| true),
            store: Arc::new(Settings::new()),
            compatibility: Arc::new(MatchingColumn),
            cache: None,
        }
    }

    /// Sets the repository used to prune deleted items.
    pub fn repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = repository;
        self
    }

    /// Sets the persisted store for widths, layout and sorter.
    pub fn store(mut self, store: Arc<dyn PersistedStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the filter-to-column compatibility predicate.
    pub fn compatibility(mut self, compatibility: Arc<dyn FilterCompatibility>) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Sets the session cache the selection is saved to and restored from.
    pub fn selection_cache(mut self, cache: Arc<SelectionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the list, restoring persisted layout, sorter and selection.
    pub fn build(self) -> Result<BrowseList> {
        let options = self.options;
        let columns = ColumnRegistry::new(
            options.view_id.clone(),
            self.catalog,
            self.store.clone(),
            options.available_width,
        )?;

        let token = self.source.list_source_token();
        let selection = match self
            .cache
            .as_ref()
            .and_then(|cache| cache.load(&options.view_id, options.root))
        {
            Some(saved) => {
                tracing::debug!(target: targets::VIEW, view = %options.view_id, "selection restored from cache");
                SelectionLedger::from_saved(saved, options.default_checked, token)
            }
            None => SelectionLedger::new(options.default_checked, token),
        };

        let persisted = self
            .store
            .get_string(&sorter_key(&options.view_id))
            .filter(|json| !json.is_empty())
            .and_then(|json| match serde_json::from_str::<Sorter>(&json) {
                Ok(sorter) => Some(sorter),
                Err(e) => {
                    browse_warn!("ignoring unreadable sorter: {}", e);
                    None
                }
            });
        let mut sort = SortCoordinator::new();
        sort.apply_sorter(persisted, false, &columns);

        let mut list = BrowseList {
            options,
            columns,
            sort,
            filter: FilterBridge::new(self.compatibility),
            selection,
            source: self.source,
            repository: self.repository,
            store: self.store,
            cache: self.cache,
            rows: Vec::new(),
        };
        list.persist_sorter();
        list.list_changed();
        Ok(list)
    }
}

static_assertions::assert_impl_all!(BrowseList: Send, Sync);
