//! Filter bridge between a filter bar and the column registry.
//!
//! A [`Filter`] is a conjunction of per-column [`CellFilter`]s. The
//! [`FilterBridge`] keeps the filter bar's per-column state in step with the
//! showing columns. The first time a filter is installed in a session, hidden
//! columns the filter can attach to are appended so the filter is visibly
//! actionable; later installs only refresh the bar.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_browse_core::Signal;
use horizon_browse_core::logging::targets;

use crate::column::{ColumnId, ColumnRegistry, ColumnSpec};
use crate::item::ItemId;

/// Predicate over a cell's text.
pub type CellPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A filter on the text of one column.
#[derive(Clone)]
pub struct CellFilter {
    column: ColumnId,
    predicate: CellPredicate,
    checks_spelling: bool,
}

impl fmt::Debug for CellFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellFilter")
            .field("column", &self.column)
            .field("checks_spelling", &self.checks_spelling)
            .finish_non_exhaustive()
    }
}

impl CellFilter {
    /// Creates a filter on `column`.
    pub fn new<F>(column: impl Into<ColumnId>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            column: column.into(),
            predicate: Arc::new(predicate),
            checks_spelling: false,
        }
    }

    /// Marks this filter as a spelling check.
    pub fn checking_spelling(mut self) -> Self {
        self.checks_spelling = true;
        self
    }

    /// The column the filter was built from.
    pub fn column(&self) -> &ColumnId {
        &self.column
    }

    /// Whether this filter matches on spelling status.
    pub fn checks_spelling(&self) -> bool {
        self.checks_spelling
    }

    /// Tests a cell's text.
    pub fn matches(&self, text: &str) -> bool {
        (self.predicate)(text)
    }
}

/// A conjunction of cell filters.
#[derive(Clone, Default)]
pub struct Filter {
    cells: Vec<CellFilter>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.cells).finish()
    }
}

impl Filter {
    /// Creates a filter that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell filter.
    pub fn with_cell(mut self, cell: CellFilter) -> Self {
        self.cells.push(cell);
        self
    }

    /// The cell filters.
    pub fn cells(&self) -> &[CellFilter] {
        &self.cells
    }

    /// The cell filter on `column`, if any.
    pub fn cell_for(&self, column: &ColumnId) -> Option<&CellFilter> {
        self.cells.iter().find(|cell| &cell.column == column)
    }

    /// Whether the filter has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `item` passes every cell filter.
    ///
    /// Cell text comes from the catalog column's sort key; a column without
    /// one yields empty text.
    pub fn accepts(&self, item: ItemId, columns: &ColumnRegistry) -> bool {
        self.cells.iter().all(|cell| {
            let text = columns
                .catalog_spec(&cell.column)
                .and_then(|spec| spec.cell_text(item))
                .unwrap_or_default();
            cell.matches(&text)
        })
    }
}

/// Decides whether a filter can attach to a column.
pub trait FilterCompatibility: Send + Sync {
    /// Whether `filter` can be shown on `column`'s filter bar cell.
    fn can_attach(&self, filter: &Filter, column: &ColumnSpec) -> bool;
}

impl<F> FilterCompatibility for F
where
    F: Fn(&Filter, &ColumnSpec) -> bool + Send + Sync,
{
    fn can_attach(&self, filter: &Filter, column: &ColumnSpec) -> bool {
        self(filter, column)
    }
}

/// Attaches a filter to exactly the columns its cells were built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingColumn;

impl FilterCompatibility for MatchingColumn {
    fn can_attach(&self, filter: &Filter, column: &ColumnSpec) -> bool {
        filter.cell_for(&column.id).is_some()
    }
}

/// Re-entrancy guard for filter-change handling.
///
/// Clones share state, so a filter bar can hold one and check
/// [`is_held`](Self::is_held) before posting a nested change.
#[derive(Debug, Clone, Default)]
pub struct FilterGate {
    held: Arc<AtomicBool>,
}

impl FilterGate {
    /// Creates an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the gate, or returns `None` if a change is already in progress.
    pub fn try_enter(&self) -> Option<FilterGateGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FilterGateGuard {
                held: self.held.clone(),
            })
    }

    /// Whether a filter change is in progress.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Releases the [`FilterGate`] when dropped.
#[derive(Debug)]
pub struct FilterGateGuard {
    held: Arc<AtomicBool>,
}

impl Drop for FilterGateGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Keeps the filter bar in step with the column registry.
pub struct FilterBridge {
    initialization_complete: bool,
    filter: Option<Filter>,
    active_cells: Vec<ColumnId>,
    spelling_status: bool,
    compatibility: Arc<dyn FilterCompatibility>,
    gate: FilterGate,
    filter_bar_sync_required: Signal<Option<Filter>>,
}

impl Default for FilterBridge {
    fn default() -> Self {
        Self::new(Arc::new(MatchingColumn))
    }
}

impl fmt::Debug for FilterBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBridge")
            .field("initialization_complete", &self.initialization_complete)
            .field("active_cells", &self.active_cells)
            .field("spelling_status", &self.spelling_status)
            .finish()
    }
}

impl FilterBridge {
    /// Creates a bridge using `compatibility` to match filters to columns.
    pub fn new(compatibility: Arc<dyn FilterCompatibility>) -> Self {
        Self {
            initialization_complete: false,
            filter: None,
            active_cells: Vec::new(),
            spelling_status: false,
            compatibility,
            gate: FilterGate::new(),
            filter_bar_sync_required: Signal::new(),
        }
    }

    /// Signal asking the filter bar to redisplay the given filter.
    pub fn filter_bar_sync_required(&self) -> &Signal<Option<Filter>> {
        &self.filter_bar_sync_required
    }

    /// Whether the first filter of the session has been installed.
    pub fn initialization_complete(&self) -> bool {
        self.initialization_complete
    }

    /// The active filter.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Columns whose filter bar cell currently shows a filter.
    pub fn active_cells(&self) -> &[ColumnId] {
        &self.active_cells
    }

    /// Whether any cell of the active filter checks spelling, showing or not.
    pub fn spelling_status(&self) -> bool {
        self.spelling_status
    }

    /// The re-entrancy guard shared with the filter bar.
    pub fn gate(&self) -> &FilterGate {
        &self.gate
    }

    /// Installs `filter` from outside the filter bar.
    ///
    /// On the first call of a session, hidden columns the filter can attach
    /// to are appended to `columns`; the ids of those columns are returned.
    /// Later calls clear the bar and show the new filter without touching
    /// the columns.
    pub fn update_filter_bar(
        &mut self,
        filter: Option<Filter>,
        columns: &mut ColumnRegistry,
    ) -> Vec<ColumnId> {
        let mut appended = Vec::new();
        if !self.initialization_complete {
            self.initialization_complete = true;
            if let Some(filter) = &filter {
                appended = self.append_matching_hidden_columns(filter, columns);
            }
        } else {
            self.remove_all_filters();
        }

        self.filter = filter;
        self.sync_cells(columns);
        self.filter_bar_sync_required.emit(self.filter.clone());
        appended
    }

    /// Records a filter edited in the filter bar itself.
    pub fn set_filter(&mut self, filter: Option<Filter>, columns: &ColumnRegistry) {
        self.filter = filter;
        self.sync_cells(columns);
    }

    /// Clears every filter bar cell and the active filter.
    pub fn remove_all_filters(&mut self) {
        self.filter = None;
        self.active_cells.clear();
        self.spelling_status = false;
    }

    /// Drops cells whose column is no longer showing and refreshes the
    /// spelling status from the whole filter.
    pub fn sync_cells(&mut self, columns: &ColumnRegistry) {
        self.active_cells = self
            .filter
            .iter()
            .flat_map(Filter::cells)
            .filter(|cell| columns.is_showing(&cell.column))
            .map(|cell| cell.column.clone())
            .collect();
        self.spelling_status = self
            .filter
            .iter()
            .flat_map(Filter::cells)
            .any(CellFilter::checks_spelling);
        tracing::trace!(
            target: targets::FILTER,
            cells = ?self.active_cells,
            spelling = self.spelling_status,
            "filter bar synced"
        );
    }

    fn append_matching_hidden_columns(
        &self,
        filter: &Filter,
        columns: &mut ColumnRegistry,
    ) -> Vec<ColumnId> {
        let matching: Vec<ColumnSpec> = columns
            .hidden_columns()
            .into_iter()
            .filter(|spec| self.compatibility.can_attach(filter, spec))
            .cloned()
            .collect();
        if matching.is_empty() {
            return Vec::new();
        }

        columns.batch(|columns| {
            matching
                .into_iter()
                .map(|spec| {
                    tracing::debug!(target: targets::FILTER, column = %spec.id, "appending column for filter");
                    let id = spec.id.clone();
                    let end = columns.len();
                    columns.insert_column(spec, end);
                    id
                })
                .collect()
        })
    }
}

static_assertions::assert_impl_all!(FilterBridge: Send, Sync);
static_assertions::assert_impl_all!(Filter: Send, Sync);
