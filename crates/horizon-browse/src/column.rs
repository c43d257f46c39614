//! Column registry for browse lists.
//!
//! A browse list draws from a fixed catalog of *possible* columns. The
//! [`ColumnRegistry`] tracks which of them are showing, in what order and how
//! wide, and persists that layout through a [`PersistedStore`].
//!
//! # Notifications
//!
//! Every structural change (insert, remove, reorder, width) raises
//! `columns_changed(width_only)`. Changes made inside [`ColumnRegistry::batch`]
//! are coalesced into one notification, whose flag is `true` only when every
//! change in the batch touched widths alone.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_browse::column::{ColumnRegistry, ColumnSpec};
//! use horizon_browse::settings::Settings;
//!
//! let catalog = vec![
//!     ColumnSpec::new("form", "Form"),
//!     ColumnSpec::new("gloss", "Gloss").visible(false),
//! ];
//! let mut registry =
//!     ColumnRegistry::new("lexicon", catalog, Arc::new(Settings::new()), 800).unwrap();
//!
//! assert_eq!(registry.len(), 1);
//! registry.toggle_column(&"gloss".into()).unwrap();
//! assert_eq!(registry.len(), 2);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_browse_core::logging::targets;
use horizon_browse_core::Signal;
use serde::{Deserialize, Serialize};

use crate::error::{BrowseError, Result};
use crate::item::ItemId;
use crate::settings::PersistedStore;

/// Narrowest width a column may have, in device-independent pixels.
pub const MINIMUM_COLUMN_WIDTH: i32 = 20;

/// Pixels per inch used when converting declared point widths.
const POINTS_DPI: i64 = 96;

/// Millipoints per inch.
const MILLIPOINTS_PER_INCH: i64 = 72_000;

/// Stable identity of a column, independent of its display position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    /// Creates a column id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The default width a column declares for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredWidth {
    /// A percentage of the available width.
    Percent(u32),
    /// An absolute width in millipoints (1/72000 inch).
    Points(u32),
}

impl Default for DeclaredWidth {
    fn default() -> Self {
        DeclaredWidth::Points(48_000)
    }
}

impl DeclaredWidth {
    /// Resolves the declared width to pixels, given the available width.
    pub fn resolve(self, available_width: i32) -> i32 {
        let px = match self {
            DeclaredWidth::Percent(pct) => i64::from(available_width) * i64::from(pct) / 100,
            DeclaredWidth::Points(mp) => i64::from(mp) * POINTS_DPI / MILLIPOINTS_PER_INCH,
        };
        clamp_width(px)
    }
}

fn clamp_width(px: i64) -> i32 {
    i32::try_from(px)
        .unwrap_or(i32::MAX)
        .max(MINIMUM_COLUMN_WIDTH)
}

/// Produces the comparable text of a cell.
pub type SortKeyFn = Arc<dyn Fn(ItemId) -> String + Send + Sync>;

/// Describes one possible column.
#[derive(Clone)]
pub struct ColumnSpec {
    /// Stable identity.
    pub id: ColumnId,
    /// Header label.
    pub label: String,
    /// Cell text used for sorting and filtering; `None` makes the column unsortable.
    pub sort_key: Option<SortKeyFn>,
    /// Width used when nothing is persisted.
    pub default_width: DeclaredWidth,
    /// Whether the column shows when no layout has been persisted.
    pub visible: bool,
    /// Whether the by-length comparison applies to this column.
    pub can_sort_by_length: bool,
    /// Suppresses saving the column list while this column is showing.
    pub do_not_persist: bool,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("sortable", &self.sort_key.is_some())
            .field("default_width", &self.default_width)
            .field("visible", &self.visible)
            .field("can_sort_by_length", &self.can_sort_by_length)
            .field("do_not_persist", &self.do_not_persist)
            .finish()
    }
}

impl ColumnSpec {
    /// Creates a visible, unsortable column with the default width.
    pub fn new(id: impl Into<ColumnId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            sort_key: None,
            default_width: DeclaredWidth::default(),
            visible: true,
            can_sort_by_length: false,
            do_not_persist: false,
        }
    }

    /// Sets the cell text producer, making the column sortable.
    pub fn with_sort_key<F>(mut self, key: F) -> Self
    where
        F: Fn(ItemId) -> String + Send + Sync + 'static,
    {
        self.sort_key = Some(Arc::new(key));
        self
    }

    /// Sets the declared default width.
    pub fn with_default_width(mut self, width: DeclaredWidth) -> Self {
        self.default_width = width;
        self
    }

    /// Sets whether the column shows by default.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Allows the by-length comparison on this column.
    pub fn sortable_by_length(mut self) -> Self {
        self.can_sort_by_length = true;
        self
    }

    /// Marks the column as one whose presence must not be persisted.
    pub fn do_not_persist(mut self) -> Self {
        self.do_not_persist = true;
        self
    }

    /// Whether the column can be sorted on.
    pub fn is_sortable(&self) -> bool {
        self.sort_key.is_some()
    }

    /// The cell text for `item`, if the column has a key.
    pub fn cell_text(&self, item: ItemId) -> Option<String> {
        self.sort_key.as_ref().map(|key| key(item))
    }
}

/// The outcome of [`ColumnRegistry::install_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnInstall {
    /// At least one previously showing column is gone.
    pub removed_any: bool,
    /// Columns present before and after appear in a different relative order.
    pub order_changed: bool,
}

/// The outcome of [`ColumnRegistry::toggle_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnToggle {
    /// The column was showing and has been removed from this index.
    Removed(usize),
    /// The column was hidden and has been inserted at this index.
    Inserted(usize),
}

#[derive(Debug, Clone)]
struct Column {
    spec: ColumnSpec,
    width: i32,
}

/// Ordered, mutable list of showing columns.
pub struct ColumnRegistry {
    view_id: String,
    catalog: Vec<ColumnSpec>,
    columns: Vec<Column>,
    store: Arc<dyn PersistedStore>,
    available_width: i32,
    batch_depth: usize,
    /// Pending coalesced notification; the flag is the width-only state.
    pending: Option<bool>,
    columns_changed: Signal<bool>,
}

impl fmt::Debug for ColumnRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRegistry")
            .field("view_id", &self.view_id)
            .field("columns", &self.ids())
            .field("available_width", &self.available_width)
            .finish()
    }
}

impl ColumnRegistry {
    /// Builds the showing columns for `view_id` from `catalog`.
    ///
    /// The persisted column list wins when present; otherwise the catalog's
    /// `visible` flags decide, and if no column is visible the first catalog
    /// column is shown.
    pub fn new(
        view_id: impl Into<String>,
        catalog: Vec<ColumnSpec>,
        store: Arc<dyn PersistedStore>,
        available_width: i32,
    ) -> Result<Self> {
        if catalog.is_empty() {
            return Err(BrowseError::EmptyCatalog);
        }

        let mut registry = Self {
            view_id: view_id.into(),
            catalog,
            columns: Vec::new(),
            store,
            available_width,
            batch_depth: 0,
            pending: None,
            columns_changed: Signal::new(),
        };

        let mut specs = registry.persisted_layout();
        if specs.is_empty() {
            specs = registry
                .catalog
                .iter()
                .filter(|spec| spec.visible)
                .cloned()
                .collect();
        }
        if specs.is_empty() {
            specs.extend(registry.catalog.first().cloned());
        }

        registry.columns = specs
            .into_iter()
            .map(|spec| {
                let width = registry.stored_width(&spec.id).unwrap_or_else(|| {
                    spec.default_width.resolve(registry.available_width)
                });
                Column { spec, width }
            })
            .collect();
        registry.fit_available_width();

        tracing::debug!(
            target: targets::COLUMNS,
            view = %registry.view_id,
            columns = ?registry.ids(),
            "column registry opened"
        );
        Ok(registry)
    }

    /// Signal emitted after structural changes; the argument is `true` when
    /// only widths changed.
    pub fn columns_changed(&self) -> &Signal<bool> {
        &self.columns_changed
    }

    /// The view identity used in persisted keys.
    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    /// Number of showing columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false once constructed; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The showing column at `index`.
    pub fn column(&self, index: usize) -> Option<&ColumnSpec> {
        self.columns.get(index).map(|c| &c.spec)
    }

    /// The showing columns in display order.
    pub fn specs(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().map(|c| &c.spec)
    }

    /// Ids of the showing columns in display order.
    pub fn ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.spec.id.clone()).collect()
    }

    /// Current width of the column at `index`.
    pub fn width(&self, index: usize) -> Option<i32> {
        self.columns.get(index).map(|c| c.width)
    }

    /// Current widths in display order.
    pub fn widths(&self) -> Vec<i32> {
        self.columns.iter().map(|c| c.width).collect()
    }

    /// Total width the columns are laid out in.
    pub fn available_width(&self) -> i32 {
        self.available_width
    }

    /// Every possible column, showing or not.
    pub fn catalog(&self) -> &[ColumnSpec] {
        &self.catalog
    }

    /// Catalog columns that are not showing, in catalog order.
    pub fn hidden_columns(&self) -> Vec<&ColumnSpec> {
        self.catalog
            .iter()
            .filter(|spec| !self.is_showing(&spec.id))
            .collect()
    }

    /// Whether the column is showing.
    pub fn is_showing(&self, id: &ColumnId) -> bool {
        self.index_of(id).is_some()
    }

    /// Display index of a showing column.
    pub fn index_of(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.spec.id == id)
    }

    /// Looks a column up in the catalog.
    pub fn catalog_spec(&self, id: &ColumnId) -> Option<&ColumnSpec> {
        self.catalog.iter().find(|spec| &spec.id == id)
    }

    // =========================================================================
    // Structural changes
    // =========================================================================

    /// Inserts a column, clamping `index` to `[0, len]`.
    ///
    /// Returns the index the column ended up at. A column that is already
    /// showing stays where it is. When the new column does not fit, the
    /// available width grows to make room.
    pub fn insert_column(&mut self, spec: ColumnSpec, index: usize) -> usize {
        if let Some(existing) = self.index_of(&spec.id) {
            tracing::debug!(target: targets::COLUMNS, column = %spec.id, "column already showing");
            return existing;
        }
        if self.catalog_spec(&spec.id).is_none() {
            self.catalog.push(spec.clone());
        }

        let index = index.min(self.columns.len());
        let width = self
            .stored_width(&spec.id)
            .unwrap_or_else(|| spec.default_width.resolve(self.available_width));
        tracing::debug!(target: targets::COLUMNS, column = %spec.id, index, width, "insert column");
        self.columns.insert(index, Column { spec, width });
        self.fit_available_width();

        self.save_layout();
        self.notify(false);
        index
    }

    /// Removes the column at `index`.
    ///
    /// Fails without changing anything when `index` is out of range or the
    /// column is the last one showing.
    pub fn remove_column(&mut self, index: usize) -> Result<ColumnSpec> {
        if index >= self.columns.len() {
            return Err(BrowseError::invalid_index(index, self.columns.len()));
        }
        if self.columns.len() == 1 {
            return Err(BrowseError::LastColumn);
        }

        let removed = self.columns.remove(index);
        tracing::debug!(target: targets::COLUMNS, column = %removed.spec.id, index, "remove column");

        self.save_layout();
        self.notify(false);
        Ok(removed.spec)
    }

    /// Reorders the columns so that new position `i` holds the column
    /// previously at `mapping[i]`.
    pub fn reorder(&mut self, mapping: &[usize]) -> Result<()> {
        let len = self.columns.len();
        if mapping.len() != len {
            return Err(BrowseError::invalid_permutation(format!(
                "expected {} indices, got {}",
                len,
                mapping.len()
            )));
        }
        let mut seen = vec![false; len];
        for &old in mapping {
            let Some(slot) = seen.get_mut(old) else {
                return Err(BrowseError::invalid_permutation(format!(
                    "index {old} is out of range"
                )));
            };
            if *slot {
                return Err(BrowseError::invalid_permutation(format!(
                    "index {old} appears twice"
                )));
            }
            *slot = true;
        }

        if mapping.iter().enumerate().all(|(i, &old)| i == old) {
            return Ok(());
        }

        let old = std::mem::take(&mut self.columns);
        self.columns = mapping.iter().map(|&i| old[i].clone()).collect();
        tracing::debug!(target: targets::COLUMNS, columns = ?self.ids(), "reorder columns");

        self.save_layout();
        self.notify(false);
        Ok(())
    }

    /// Replaces the showing columns with `ids`, in that order.
    ///
    /// Kept columns keep their current widths.
    pub fn install_columns(&mut self, ids: &[ColumnId]) -> Result<ColumnInstall> {
        if ids.is_empty() {
            return Err(BrowseError::LastColumn);
        }
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id) {
                return Err(BrowseError::invalid_permutation(format!(
                    "column '{id}' appears twice"
                )));
            }
            let spec = self
                .catalog_spec(id)
                .ok_or_else(|| BrowseError::UnknownColumn(id.clone()))?;
            specs.push(spec.clone());
        }

        let old_ids = self.ids();
        let removed_any = old_ids.iter().any(|id| !seen.contains(id));
        let kept_old: Vec<&ColumnId> = old_ids.iter().filter(|id| seen.contains(id)).collect();
        let old_set: HashSet<&ColumnId> = old_ids.iter().collect();
        let kept_new: Vec<&ColumnId> = ids.iter().filter(|id| old_set.contains(id)).collect();
        let order_changed = kept_old != kept_new;

        if old_ids.as_slice() == ids {
            return Ok(ColumnInstall::default());
        }

        let mut old_columns = std::mem::take(&mut self.columns);
        self.columns = specs
            .into_iter()
            .map(|spec| match old_columns.iter().position(|c| c.spec.id == spec.id) {
                Some(pos) => old_columns.swap_remove(pos),
                None => {
                    let width = self
                        .stored_width(&spec.id)
                        .unwrap_or_else(|| spec.default_width.resolve(self.available_width));
                    Column { spec, width }
                }
            })
            .collect();
        self.fit_available_width();

        tracing::debug!(
            target: targets::COLUMNS,
            columns = ?self.ids(),
            removed_any,
            order_changed,
            "install columns"
        );
        self.save_layout();
        self.notify(false);
        Ok(ColumnInstall {
            removed_any,
            order_changed,
        })
    }

    /// Shows a hidden column or hides a showing one.
    ///
    /// A newly shown column is placed after every showing column that precedes
    /// it in catalog order.
    pub fn toggle_column(&mut self, id: &ColumnId) -> Result<ColumnToggle> {
        if let Some(index) = self.index_of(id) {
            self.remove_column(index)?;
            return Ok(ColumnToggle::Removed(index));
        }

        let position = self
            .catalog
            .iter()
            .position(|spec| &spec.id == id)
            .ok_or_else(|| BrowseError::UnknownColumn(id.clone()))?;
        let spec = self.catalog[position].clone();
        let index = self.catalog[..position]
            .iter()
            .filter(|spec| self.is_showing(&spec.id))
            .count();
        Ok(ColumnToggle::Inserted(self.insert_column(spec, index)))
    }

    // =========================================================================
    // Widths
    // =========================================================================

    /// The width stored for the column at `index`, or its declared default.
    pub fn persisted_width(&self, index: usize) -> Result<i32> {
        let column = self
            .columns
            .get(index)
            .ok_or_else(|| BrowseError::invalid_index(index, self.columns.len()))?;
        Ok(self
            .stored_width(&column.spec.id)
            .unwrap_or_else(|| column.spec.default_width.resolve(self.available_width)))
    }

    /// Sets and persists the width of the column at `index`.
    ///
    /// Widths below [`MINIMUM_COLUMN_WIDTH`] are raised to it.
    pub fn set_persisted_width(&mut self, index: usize, width: i32) -> Result<()> {
        let len = self.columns.len();
        let column = self
            .columns
            .get_mut(index)
            .ok_or_else(|| BrowseError::invalid_index(index, len))?;
        let width = width.max(MINIMUM_COLUMN_WIDTH);
        let key = width_key(&self.view_id, &column.spec.id);
        column.width = width;
        self.store.set_int(&key, i64::from(width));
        tracing::trace!(target: targets::COLUMNS, key = %key, width, "column width persisted");

        self.notify(true);
        Ok(())
    }

    /// Changes the total available width. Existing column widths are kept.
    pub fn set_available_width(&mut self, width: i32) {
        self.available_width = width.max(MINIMUM_COLUMN_WIDTH);
        self.fit_available_width();
    }

    // =========================================================================
    // Persistence and batching
    // =========================================================================

    /// Persists the ordered list of showing column ids.
    ///
    /// Skipped while any showing column is marked `do_not_persist`.
    pub fn save_layout(&self) {
        if self.columns.iter().any(|c| c.spec.do_not_persist) {
            tracing::trace!(target: targets::COLUMNS, "layout not persisted");
            return;
        }
        match serde_json::to_string(&self.ids()) {
            Ok(json) => self.store.set_string(&layout_key(&self.view_id), &json),
            Err(e) => {
                tracing::warn!(target: targets::COLUMNS, "cannot encode column layout: {}", e)
            }
        }
    }

    /// Runs `f` with notifications coalesced into at most one.
    ///
    /// Batches nest; only the outermost one emits.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0
            && let Some(width_only) = self.pending.take()
        {
            self.columns_changed.emit(width_only);
        }
        result
    }

    fn notify(&mut self, width_only: bool) {
        if self.batch_depth > 0 {
            self.pending = Some(self.pending.map_or(width_only, |p| p && width_only));
        } else {
            self.columns_changed.emit(width_only);
        }
    }

    fn stored_width(&self, id: &ColumnId) -> Option<i32> {
        self.store
            .get_int(&width_key(&self.view_id, id))
            .map(clamp_width)
    }

    fn persisted_layout(&self) -> Vec<ColumnSpec> {
        let Some(json) = self.store.get_string(&layout_key(&self.view_id)) else {
            return Vec::new();
        };
        let ids: Vec<ColumnId> = match serde_json::from_str(&json) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(target: targets::COLUMNS, "ignoring unreadable column layout: {}", e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| {
                let spec = self.catalog_spec(id);
                if spec.is_none() {
                    tracing::debug!(target: targets::COLUMNS, column = %id, "skipping unknown persisted column");
                }
                spec.cloned()
            })
            .collect()
    }

    fn fit_available_width(&mut self) {
        let total: i64 = self.columns.iter().map(|c| i64::from(c.width)).sum();
        if total > i64::from(self.available_width) {
            self.available_width = i32::try_from(total).unwrap_or(i32::MAX);
            tracing::trace!(target: targets::COLUMNS, width = self.available_width, "available width grown");
        }
    }
}

/// Persisted key for a column width.
pub fn width_key(view_id: &str, column: &ColumnId) -> String {
    format!("{view_id}_{column}_Width")
}

/// Persisted key for the ordered column list.
pub fn layout_key(view_id: &str) -> String {
    format!("{view_id}_ColumnList")
}

static_assertions::assert_impl_all!(ColumnRegistry: Send, Sync);
static_assertions::assert_impl_all!(ColumnSpec: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use parking_lot::Mutex;

    fn catalog() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("a", "A").with_sort_key(|i| i.0.to_string()),
            ColumnSpec::new("b", "B").with_default_width(DeclaredWidth::Percent(25)),
            ColumnSpec::new("c", "C"),
            ColumnSpec::new("d", "D").visible(false),
        ]
    }

    fn registry() -> (ColumnRegistry, Arc<Settings>) {
        let store = Arc::new(Settings::new());
        let registry = ColumnRegistry::new("view", catalog(), store.clone(), 400).unwrap();
        (registry, store)
    }

    fn ids(registry: &ColumnRegistry) -> Vec<String> {
        registry.ids().iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_open_from_catalog_flags() {
        let (registry, _) = registry();
        assert_eq!(ids(&registry), ["a", "b", "c"]);
        assert_eq!(registry.width(0), Some(64));
        assert_eq!(registry.width(1), Some(100));
        assert_eq!(registry.hidden_columns().len(), 1);
    }

    #[test]
    fn test_open_from_persisted_layout() {
        let store = Arc::new(Settings::new());
        store.set_string("view_ColumnList", r#"["d","zz","a","d"]"#);
        let registry = ColumnRegistry::new("view", catalog(), store, 400).unwrap();
        assert_eq!(ids(&registry), ["d", "a"]);
    }

    #[test]
    fn test_open_without_visible_columns_shows_first() {
        let catalog = vec![
            ColumnSpec::new("x", "X").visible(false),
            ColumnSpec::new("y", "Y").visible(false),
        ];
        let registry =
            ColumnRegistry::new("view", catalog, Arc::new(Settings::new()), 400).unwrap();
        assert_eq!(ids(&registry), ["x"]);
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let result = ColumnRegistry::new("view", Vec::new(), Arc::new(Settings::new()), 400);
        assert!(matches!(result, Err(BrowseError::EmptyCatalog)));
    }

    #[test]
    fn test_declared_width_resolution() {
        assert_eq!(DeclaredWidth::Percent(50).resolve(300), 150);
        assert_eq!(DeclaredWidth::Points(72_000).resolve(0), 96);
        assert_eq!(DeclaredWidth::Points(1_000).resolve(0), MINIMUM_COLUMN_WIDTH);
    }

    #[test]
    fn test_insert_clamps_index_and_grows_width() {
        let (mut registry, _) = registry();
        let spec = ColumnSpec::new("wide", "Wide").with_default_width(DeclaredWidth::Points(720_000));

        let index = registry.insert_column(spec, 99);

        assert_eq!(index, 3);
        assert_eq!(registry.width(3), Some(960));
        assert_eq!(registry.available_width(), 64 + 100 + 64 + 960);
        assert!(registry.catalog_spec(&"wide".into()).is_some());
    }

    #[test]
    fn test_insert_showing_column_is_noop() {
        let (mut registry, _) = registry();
        let spec = registry.column(2).unwrap().clone();
        assert_eq!(registry.insert_column(spec, 0), 2);
        assert_eq!(ids(&registry), ["a", "b", "c"]);
    }

    #[test]
    fn test_remove_out_of_range_leaves_state() {
        let (mut registry, _) = registry();
        let before = (registry.ids(), registry.widths());

        let result = registry.remove_column(3);

        assert!(matches!(
            result,
            Err(BrowseError::InvalidColumnIndex { index: 3, len: 3 })
        ));
        assert_eq!((registry.ids(), registry.widths()), before);
    }

    #[test]
    fn test_remove_last_column_refused() {
        let (mut registry, _) = registry();
        registry.remove_column(0).unwrap();
        registry.remove_column(0).unwrap();
        assert!(matches!(registry.remove_column(0), Err(BrowseError::LastColumn)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reorder() {
        let (mut registry, store) = registry();
        registry.reorder(&[2, 0, 1]).unwrap();
        assert_eq!(ids(&registry), ["c", "a", "b"]);
        assert_eq!(registry.widths(), [64, 64, 100]);
        assert_eq!(
            store.get_string("view_ColumnList").as_deref(),
            Some(r#"["c","a","b"]"#)
        );
    }

    #[test]
    fn test_reorder_rejects_non_permutations() {
        let (mut registry, _) = registry();
        for bad in [&[0, 1][..], &[0, 1, 1], &[0, 1, 3]] {
            assert!(matches!(
                registry.reorder(bad),
                Err(BrowseError::InvalidPermutation { .. })
            ));
        }
        assert_eq!(ids(&registry), ["a", "b", "c"]);
    }

    #[test]
    fn test_install_columns_reports_changes() {
        let (mut registry, _) = registry();
        registry.set_persisted_width(1, 150).unwrap();

        let install = registry
            .install_columns(&["b".into(), "a".into(), "d".into()])
            .unwrap();

        assert_eq!(
            install,
            ColumnInstall {
                removed_any: true,
                order_changed: true
            }
        );
        assert_eq!(ids(&registry), ["b", "a", "d"]);
        assert_eq!(registry.width(0), Some(150));

        let install = registry.install_columns(&["b".into(), "a".into(), "c".into()]).unwrap();
        assert_eq!(
            install,
            ColumnInstall {
                removed_any: true,
                order_changed: false
            }
        );
    }

    #[test]
    fn test_install_columns_rejects_unknown() {
        let (mut registry, _) = registry();
        let result = registry.install_columns(&["a".into(), "nope".into()]);
        assert!(matches!(result, Err(BrowseError::UnknownColumn(_))));
        assert_eq!(ids(&registry), ["a", "b", "c"]);
    }

    #[test]
    fn test_toggle_column_position() {
        let (mut registry, _) = registry();
        registry.remove_column(1).unwrap();

        assert_eq!(
            registry.toggle_column(&"b".into()).unwrap(),
            ColumnToggle::Inserted(1)
        );
        assert_eq!(
            registry.toggle_column(&"d".into()).unwrap(),
            ColumnToggle::Inserted(3)
        );
        assert_eq!(
            registry.toggle_column(&"a".into()).unwrap(),
            ColumnToggle::Removed(0)
        );
        assert_eq!(ids(&registry), ["b", "c", "d"]);
    }

    #[test]
    fn test_width_roundtrip_through_store() {
        let (mut registry, store) = registry();
        registry.set_persisted_width(2, 120).unwrap();
        assert_eq!(store.get_int("view_c_Width"), Some(120));

        let reopened = ColumnRegistry::new("view", catalog(), store, 400).unwrap();
        assert_eq!(reopened.persisted_width(2).unwrap(), 120);
        assert_eq!(reopened.width(2), Some(120));
    }

    #[test]
    fn test_width_minimum() {
        let (mut registry, _) = registry();
        registry.set_persisted_width(0, 3).unwrap();
        assert_eq!(registry.width(0), Some(MINIMUM_COLUMN_WIDTH));
    }

    #[test]
    fn test_do_not_persist_blocks_layout_save() {
        let (mut registry, store) = registry();
        registry.insert_column(ColumnSpec::new("tmp", "Tmp").do_not_persist(), 0);
        assert!(store.get_string("view_ColumnList").is_none());
    }

    #[test]
    fn test_notifications_coalesce_in_batch() {
        let (mut registry, _) = registry();
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        registry.columns_changed().connect(move |width_only| {
            received_clone.lock().push(*width_only);
        });

        registry.batch(|r| {
            r.set_persisted_width(0, 90).unwrap();
            r.batch(|r| r.set_persisted_width(1, 90).unwrap());
        });
        registry.batch(|r| {
            r.set_persisted_width(0, 80).unwrap();
            r.reorder(&[1, 0, 2]).unwrap();
        });
        registry.batch(|_| ());
        registry.remove_column(0).unwrap();

        assert_eq!(*received.lock(), vec![true, false, false]);
    }
}
