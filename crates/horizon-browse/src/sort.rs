//! Sort coordination for browse lists.
//!
//! The active sort is either a single [`LeafSorter`] or a composite of several
//! leaves evaluated in order, the first being primary. Leaves name their
//! column by [`ColumnId`], so reordering columns never invalidates a sorter;
//! removing a column does, and [`SortCoordinator::apply_sorter`] degrades the
//! sorter instead of failing.
//!
//! # Header protocol
//!
//! - Clicking a column sorts on it ascending, or reverses it when it is
//!   already the primary leaf.
//! - Shift-clicking reverses the column's leaf if the sorter has one, and
//!   otherwise appends a new leaf.
//! - The from-end and by-length toggles apply to the column they are invoked
//!   on and are remembered per column.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use horizon_browse_core::logging::{span_names, targets};
use horizon_browse_core::{PerfSpan, Signal};
use serde::{Deserialize, Serialize};

use crate::column::{ColumnId, ColumnRegistry, SortKeyFn};
use crate::error::{BrowseError, Result};
use crate::item::ItemId;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Ascending,
    /// Descending order (Z-A, 9-0).
    Descending,
}

impl SortOrder {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("ascending"),
            SortOrder::Descending => f.write_str("descending"),
        }
    }
}

/// How cell text is compared. The two flags are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CompareMode {
    /// Compare text from its last character backwards.
    pub from_end: bool,
    /// Compare character counts before the text itself.
    pub by_length: bool,
}

impl CompareMode {
    /// Compares two cell texts in this mode, ascending.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let by_length = if self.by_length {
            a.chars().count().cmp(&b.chars().count())
        } else {
            Ordering::Equal
        };
        by_length.then_with(|| {
            if self.from_end {
                a.chars().rev().cmp(b.chars().rev())
            } else {
                a.cmp(b)
            }
        })
    }
}

/// A single-column sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafSorter {
    /// The column sorted on.
    pub column: ColumnId,
    /// Direction.
    pub order: SortOrder,
    /// Comparison mode.
    #[serde(default)]
    pub mode: CompareMode,
}

impl LeafSorter {
    /// Creates a leaf with the normal comparison mode.
    pub fn new(column: impl Into<ColumnId>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
            mode: CompareMode::default(),
        }
    }

    /// Sets the comparison mode.
    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    /// Compares two cell texts according to mode and direction.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let ordering = self.mode.compare(a, b);
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// The active sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sorter {
    /// A single leaf.
    Leaf(LeafSorter),
    /// Leaves evaluated lexicographically, each on a distinct column.
    Composite(Vec<LeafSorter>),
}

impl Sorter {
    /// Builds a sorter from leaves, normalizing the shape.
    ///
    /// Later leaves on an already used column are dropped. No leaves gives
    /// `None`; a single leaf gives [`Sorter::Leaf`].
    pub fn from_leaves(leaves: Vec<LeafSorter>) -> Option<Self> {
        let mut distinct: Vec<LeafSorter> = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            if !distinct.iter().any(|l| l.column == leaf.column) {
                distinct.push(leaf);
            }
        }
        match distinct.len() {
            0 => None,
            1 => distinct.pop().map(Sorter::Leaf),
            _ => Some(Sorter::Composite(distinct)),
        }
    }

    /// The leaves in priority order.
    pub fn leaves(&self) -> &[LeafSorter] {
        match self {
            Sorter::Leaf(leaf) => std::slice::from_ref(leaf),
            Sorter::Composite(leaves) => leaves,
        }
    }

    /// The primary leaf.
    pub fn primary(&self) -> Option<&LeafSorter> {
        self.leaves().first()
    }

    /// The leaf sorting on `column`, if any.
    pub fn leaf_for(&self, column: &ColumnId) -> Option<&LeafSorter> {
        self.leaves().iter().find(|leaf| &leaf.column == column)
    }

    /// Whether more than one leaf is involved.
    pub fn is_composite(&self) -> bool {
        matches!(self, Sorter::Composite(_))
    }

    fn leaves_mut(&mut self) -> &mut [LeafSorter] {
        match self {
            Sorter::Leaf(leaf) => std::slice::from_mut(leaf),
            Sorter::Composite(leaves) => leaves,
        }
    }

    fn into_leaves(self) -> Vec<LeafSorter> {
        match self {
            Sorter::Leaf(leaf) => vec![leaf],
            Sorter::Composite(leaves) => leaves,
        }
    }
}

/// Prominence of a header sort indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorSize {
    /// Primary leaf.
    Large,
    /// Secondary leaf.
    Medium,
    /// Every later leaf.
    Small,
}

impl IndicatorSize {
    fn for_rank(rank: usize) -> Self {
        match rank {
            0 => IndicatorSize::Large,
            1 => IndicatorSize::Medium,
            _ => IndicatorSize::Small,
        }
    }
}

/// The sort arrow shown on a column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortIndicator {
    /// Arrow direction.
    pub order: SortOrder,
    /// Arrow prominence.
    pub size: IndicatorSize,
}

/// Why a requested sorter could not be applied as given.
///
/// Never surfaced as an error; the coordinator degrades and logs instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SortDegradation {
    /// The leaf's column is not showing.
    ColumnMissing(ColumnId),
    /// The leaf's column has no sort key.
    Unsortable(ColumnId),
    /// Nothing usable remained; sorting falls back to this column.
    FellBackToDefault(ColumnId),
}

impl fmt::Display for SortDegradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDegradation::ColumnMissing(id) => write!(f, "column '{id}' is not showing"),
            SortDegradation::Unsortable(id) => write!(f, "column '{id}' cannot be sorted"),
            SortDegradation::FellBackToDefault(id) => {
                write!(f, "falling back to the default sorter on '{id}'")
            }
        }
    }
}

/// Owns the active sorter and the header indicators derived from it.
pub struct SortCoordinator {
    sorter: Option<Sorter>,
    current_column: Option<ColumnId>,
    indicators: HashMap<ColumnId, SortIndicator>,
    /// Last comparison mode used on each column.
    modes: HashMap<ColumnId, CompareMode>,
    sorter_changed: Signal<()>,
}

impl Default for SortCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SortCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortCoordinator")
            .field("sorter", &self.sorter)
            .field("current_column", &self.current_column)
            .finish()
    }
}

impl SortCoordinator {
    /// Creates a coordinator with no sorter.
    pub fn new() -> Self {
        Self {
            sorter: None,
            current_column: None,
            indicators: HashMap::new(),
            modes: HashMap::new(),
            sorter_changed: Signal::new(),
        }
    }

    /// Signal emitted whenever the sorter changes.
    pub fn sorter_changed(&self) -> &Signal<()> {
        &self.sorter_changed
    }

    /// The active sorter.
    pub fn sorter(&self) -> Option<&Sorter> {
        self.sorter.as_ref()
    }

    /// The column the header context actions currently apply to.
    pub fn current_column(&self) -> Option<&ColumnId> {
        self.current_column.as_ref()
    }

    /// The indicator on `column`, if it is sorted on.
    pub fn indicator(&self, column: &ColumnId) -> Option<SortIndicator> {
        self.indicators.get(column).copied()
    }

    /// The indicator on the showing column at `index`.
    pub fn indicator_at(&self, index: usize, columns: &ColumnRegistry) -> Option<SortIndicator> {
        columns
            .column(index)
            .and_then(|spec| self.indicator(&spec.id))
    }

    /// Display indices of the sorted columns, primary first.
    pub fn sorted_columns(&self, columns: &ColumnRegistry) -> Vec<usize> {
        self.sorter
            .iter()
            .flat_map(Sorter::leaves)
            .filter_map(|leaf| columns.index_of(&leaf.column))
            .collect()
    }

    /// Whether the column at `index` has a leaf in the active sorter that
    /// compares from the end.
    pub fn column_active_and_sorted_from_end(&self, index: usize, columns: &ColumnRegistry) -> bool {
        columns.column(index).is_some_and(|spec| {
            self.sorter
                .as_ref()
                .and_then(|s| s.leaf_for(&spec.id))
                .is_some_and(|leaf| leaf.mode.from_end)
        })
    }

    /// The remembered comparison mode for `column`.
    pub fn mode_for(&self, column: &ColumnId) -> CompareMode {
        self.modes.get(column).copied().unwrap_or_default()
    }

    /// Installs `sorter`, degrading it to what the showing columns support.
    ///
    /// Leaves on missing or unsortable columns are dropped. If nothing remains,
    /// the first sortable column's default leaf is used. Emits
    /// `sorter_changed` when the result differs from the previous sorter, or
    /// when `force_changed` is set. Returns whether the sorter changed.
    pub fn apply_sorter(
        &mut self,
        sorter: Option<Sorter>,
        force_changed: bool,
        columns: &ColumnRegistry,
    ) -> bool {
        let mut kept = Vec::new();
        for leaf in sorter.map(Sorter::into_leaves).unwrap_or_default() {
            match columns.index_of(&leaf.column).and_then(|i| columns.column(i)) {
                None => self.log_degradation(SortDegradation::ColumnMissing(leaf.column)),
                Some(spec) if !spec.is_sortable() => {
                    self.log_degradation(SortDegradation::Unsortable(leaf.column))
                }
                Some(_) => kept.push(leaf),
            }
        }

        let mut next = Sorter::from_leaves(kept);
        if next.is_none() {
            next = self.default_sorter(columns);
            match &next {
                Some(default) => {
                    if let Some(leaf) = default.primary() {
                        self.log_degradation(SortDegradation::FellBackToDefault(
                            leaf.column.clone(),
                        ));
                    }
                }
                None => {
                    tracing::warn!(target: targets::SORT, "no showing column can be sorted");
                }
            }
        }

        for leaf in next.iter().flat_map(Sorter::leaves) {
            self.modes.insert(leaf.column.clone(), leaf.mode);
        }

        let changed = next != self.sorter;
        self.sorter = next;
        self.sync_indicators(columns);
        if changed || force_changed {
            self.sorter_changed.emit(());
        }
        changed
    }

    /// Handles a click on the header of the column at `index`.
    ///
    /// Returns `Ok(false)` for columns that cannot be sorted.
    pub fn click_column(
        &mut self,
        index: usize,
        shift: bool,
        columns: &ColumnRegistry,
    ) -> Result<bool> {
        let spec = columns
            .column(index)
            .ok_or_else(|| BrowseError::invalid_index(index, columns.len()))?;
        if !spec.is_sortable() {
            tracing::debug!(target: targets::SORT, column = %spec.id, "click on unsortable column ignored");
            return Ok(false);
        }
        let column = spec.id.clone();
        let fresh = LeafSorter::new(column.clone(), SortOrder::Ascending)
            .with_mode(self.mode_for(&column));

        let next = match (self.sorter.take(), shift) {
            (None, _) => Sorter::Leaf(fresh),
            (Some(current), false) => match current.primary() {
                Some(primary) if primary.column == column => {
                    let mut leaf = primary.clone();
                    leaf.order = leaf.order.reversed();
                    Sorter::Leaf(leaf)
                }
                _ => Sorter::Leaf(fresh),
            },
            (Some(mut current), true) => {
                if let Some(leaf) = current
                    .leaves_mut()
                    .iter_mut()
                    .find(|leaf| leaf.column == column)
                {
                    leaf.order = leaf.order.reversed();
                    current
                } else {
                    let mut leaves = current.into_leaves();
                    leaves.push(fresh);
                    Sorter::Composite(leaves)
                }
            }
        };

        self.sorter = Some(next);
        self.sync_indicators(columns);
        self.sorter_changed.emit(());
        Ok(true)
    }

    /// Flips the from-end comparison on the column at `index`.
    pub fn toggle_sorted_from_end(&mut self, index: usize, columns: &ColumnRegistry) -> Result<bool> {
        self.toggle_mode(index, columns, |mode| mode.from_end = !mode.from_end)
    }

    /// Flips the by-length comparison on the column at `index`.
    ///
    /// Ignored for columns that do not allow it.
    pub fn toggle_sorted_by_length(
        &mut self,
        index: usize,
        columns: &ColumnRegistry,
    ) -> Result<bool> {
        let spec = columns
            .column(index)
            .ok_or_else(|| BrowseError::invalid_index(index, columns.len()))?;
        if !spec.can_sort_by_length {
            tracing::debug!(target: targets::SORT, column = %spec.id, "by-length sort not allowed");
            return Ok(false);
        }
        self.toggle_mode(index, columns, |mode| mode.by_length = !mode.by_length)
    }

    fn toggle_mode(
        &mut self,
        index: usize,
        columns: &ColumnRegistry,
        flip: impl Fn(&mut CompareMode),
    ) -> Result<bool> {
        let spec = columns
            .column(index)
            .ok_or_else(|| BrowseError::invalid_index(index, columns.len()))?;
        if !spec.is_sortable() {
            return Ok(false);
        }
        let column = spec.id.clone();

        let mode = self.modes.entry(column.clone()).or_default();
        flip(mode);
        let mode = *mode;
        if let Some(leaf) = self
            .sorter
            .as_mut()
            .and_then(|s| s.leaves_mut().iter_mut().find(|leaf| leaf.column == column))
        {
            leaf.mode = mode;
        }
        tracing::debug!(
            target: targets::SORT,
            column = %column,
            from_end = mode.from_end,
            by_length = mode.by_length,
            "comparison mode toggled"
        );

        self.current_column = Some(column);
        self.sorter_changed.emit(());
        Ok(true)
    }

    /// Rebuilds every header indicator from the active sorter.
    ///
    /// The current column becomes the last leaf's column.
    pub fn sync_indicators(&mut self, columns: &ColumnRegistry) {
        self.indicators.clear();
        self.current_column = None;
        let Some(sorter) = &self.sorter else {
            return;
        };
        for (rank, leaf) in sorter.leaves().iter().enumerate() {
            let label = columns
                .catalog_spec(&leaf.column)
                .map_or(leaf.column.as_str(), |spec| spec.label.as_str());
            tracing::debug!(target: targets::SORT, "sort on {} {} ({})", label, leaf.order, rank);
            self.indicators.insert(
                leaf.column.clone(),
                SortIndicator {
                    order: leaf.order,
                    size: IndicatorSize::for_rank(rank),
                },
            );
            self.current_column = Some(leaf.column.clone());
        }
    }

    /// Orders `items` by the active sorter. The sort is stable.
    pub fn sort_items(&self, items: &mut [ItemId], columns: &ColumnRegistry) {
        let Some(sorter) = &self.sorter else {
            return;
        };
        let _perf = PerfSpan::new(span_names::SORT_ROWS);

        let keyed: Vec<(&LeafSorter, &SortKeyFn)> = sorter
            .leaves()
            .iter()
            .filter_map(|leaf| {
                let index = columns.index_of(&leaf.column)?;
                let key = columns.column(index)?.sort_key.as_ref()?;
                Some((leaf, key))
            })
            .collect();
        if keyed.is_empty() {
            return;
        }

        let mut rows: Vec<(ItemId, Vec<String>)> = items
            .iter()
            .map(|&item| (item, keyed.iter().map(|(_, key)| key(item)).collect()))
            .collect();
        rows.sort_by(|(_, a), (_, b)| {
            keyed
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|((leaf, _), (a, b))| leaf.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        for (slot, (item, _)) in items.iter_mut().zip(rows) {
            *slot = item;
        }
    }

    fn default_sorter(&self, columns: &ColumnRegistry) -> Option<Sorter> {
        columns.specs().find(|spec| spec.is_sortable()).map(|spec| {
            Sorter::Leaf(
                LeafSorter::new(spec.id.clone(), SortOrder::Ascending)
                    .with_mode(self.mode_for(&spec.id)),
            )
        })
    }

    fn log_degradation(&self, degradation: SortDegradation) {
        tracing::debug!(target: targets::SORT, "sorter degraded: {}", degradation);
    }
}

static_assertions::assert_impl_all!(SortCoordinator: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnSpec;
    use crate::settings::Settings;
    use parking_lot::Mutex;
    use std::sync::Arc;

    const WORDS: [&str; 4] = ["pear", "fig", "apple", "kiwi"];

    fn registry() -> ColumnRegistry {
        let catalog = vec![
            ColumnSpec::new("a", "Alpha").with_sort_key(|i| WORDS[i.0 as usize].to_string()),
            ColumnSpec::new("b", "Beta")
                .with_sort_key(|i| (i.0 % 2).to_string())
                .sortable_by_length(),
            ColumnSpec::new("c", "Gamma").with_sort_key(|i| (3 - i.0).to_string()),
            ColumnSpec::new("n", "Notes"),
        ];
        ColumnRegistry::new("sort", catalog, Arc::new(Settings::new()), 400).unwrap()
    }

    fn leaf(column: &str, order: SortOrder) -> LeafSorter {
        LeafSorter::new(column, order)
    }

    #[test]
    fn test_compare_modes() {
        let normal = CompareMode::default();
        assert_eq!(normal.compare("ab", "b"), Ordering::Less);

        let from_end = CompareMode {
            from_end: true,
            by_length: false,
        };
        assert_eq!(from_end.compare("ba", "ab"), Ordering::Less);

        let by_length = CompareMode {
            from_end: false,
            by_length: true,
        };
        assert_eq!(by_length.compare("zz", "aaa"), Ordering::Less);
        assert_eq!(by_length.compare("ab", "aa"), Ordering::Greater);
    }

    #[test]
    fn test_from_leaves_normalizes() {
        assert_eq!(Sorter::from_leaves(Vec::new()), None);
        assert_eq!(
            Sorter::from_leaves(vec![leaf("a", SortOrder::Ascending)]),
            Some(Sorter::Leaf(leaf("a", SortOrder::Ascending)))
        );
        let sorter = Sorter::from_leaves(vec![
            leaf("a", SortOrder::Ascending),
            leaf("b", SortOrder::Descending),
            leaf("a", SortOrder::Descending),
        ])
        .unwrap();
        assert_eq!(sorter.leaves().len(), 2);
        assert!(sorter.is_composite());
    }

    #[test]
    fn test_apply_none_falls_back_to_first_column() {
        let columns = registry();
        let mut sort = SortCoordinator::new();

        assert!(sort.apply_sorter(None, false, &columns));
        assert_eq!(
            sort.sorter(),
            Some(&Sorter::Leaf(leaf("a", SortOrder::Ascending)))
        );
        assert_eq!(sort.current_column(), Some(&ColumnId::from("a")));
    }

    #[test]
    fn test_apply_drops_missing_leaves() {
        let mut columns = registry();
        let mut sort = SortCoordinator::new();
        sort.apply_sorter(
            Sorter::from_leaves(vec![
                leaf("b", SortOrder::Descending),
                leaf("c", SortOrder::Ascending),
            ]),
            false,
            &columns,
        );

        columns.remove_column(1).unwrap();
        sort.apply_sorter(sort.sorter().cloned(), false, &columns);

        assert_eq!(
            sort.sorter(),
            Some(&Sorter::Leaf(leaf("c", SortOrder::Ascending)))
        );
        assert_eq!(sort.indicator(&"b".into()), None);
    }

    #[test]
    fn test_apply_drops_unsortable_leaf() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        sort.apply_sorter(
            Some(Sorter::Leaf(leaf("n", SortOrder::Descending))),
            false,
            &columns,
        );
        assert_eq!(sort.sorter().and_then(Sorter::primary).map(|l| l.column.as_str()), Some("a"));
    }

    #[test]
    fn test_apply_emits_only_on_change_unless_forced() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        sort.sorter_changed().connect(move |_| *count_clone.lock() += 1);

        sort.apply_sorter(None, false, &columns);
        sort.apply_sorter(sort.sorter().cloned(), false, &columns);
        assert_eq!(*count.lock(), 1);

        sort.apply_sorter(sort.sorter().cloned(), true, &columns);
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_click_same_column_twice_restores_direction() {
        let columns = registry();
        let mut sort = SortCoordinator::new();

        sort.click_column(2, false, &columns).unwrap();
        let first = sort.sorter().cloned();
        sort.click_column(2, false, &columns).unwrap();
        assert_eq!(
            sort.sorter(),
            Some(&Sorter::Leaf(leaf("c", SortOrder::Descending)))
        );
        sort.click_column(2, false, &columns).unwrap();
        assert_eq!(sort.sorter().cloned(), first);
    }

    #[test]
    fn test_shift_click_builds_and_reverses_composite() {
        let columns = registry();
        let mut sort = SortCoordinator::new();

        sort.click_column(1, false, &columns).unwrap();
        sort.click_column(2, true, &columns).unwrap();
        assert_eq!(
            sort.sorter(),
            Some(&Sorter::Composite(vec![
                leaf("b", SortOrder::Ascending),
                leaf("c", SortOrder::Ascending),
            ]))
        );

        sort.click_column(1, true, &columns).unwrap();
        assert_eq!(
            sort.sorter(),
            Some(&Sorter::Composite(vec![
                leaf("b", SortOrder::Descending),
                leaf("c", SortOrder::Ascending),
            ]))
        );
        assert_eq!(sort.sorted_columns(&columns), vec![1, 2]);
        assert_eq!(
            sort.indicator_at(1, &columns),
            Some(SortIndicator {
                order: SortOrder::Descending,
                size: IndicatorSize::Large
            })
        );
        assert_eq!(
            sort.indicator_at(2, &columns).map(|i| i.size),
            Some(IndicatorSize::Medium)
        );
        assert_eq!(sort.indicator_at(0, &columns), None);
    }

    #[test]
    fn test_plain_click_replaces_composite() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        sort.click_column(0, false, &columns).unwrap();
        sort.click_column(1, true, &columns).unwrap();
        sort.click_column(2, true, &columns).unwrap();
        assert_eq!(sort.indicator_at(2, &columns).map(|i| i.size), Some(IndicatorSize::Small));

        sort.click_column(1, false, &columns).unwrap();
        assert_eq!(
            sort.sorter(),
            Some(&Sorter::Leaf(leaf("b", SortOrder::Ascending)))
        );
        assert_eq!(sort.indicator_at(0, &columns), None);
    }

    #[test]
    fn test_click_unsortable_and_out_of_range() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        assert!(!sort.click_column(3, false, &columns).unwrap());
        assert!(matches!(
            sort.click_column(9, false, &columns),
            Err(BrowseError::InvalidColumnIndex { index: 9, len: 4 })
        ));
        assert!(sort.sorter().is_none());
    }

    #[test]
    fn test_mode_toggles_are_remembered() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        sort.click_column(1, false, &columns).unwrap();

        assert!(sort.toggle_sorted_from_end(1, &columns).unwrap());
        assert!(sort.column_active_and_sorted_from_end(1, &columns));
        assert!(sort.toggle_sorted_by_length(1, &columns).unwrap());
        assert!(!sort.toggle_sorted_by_length(0, &columns).unwrap());

        sort.click_column(0, false, &columns).unwrap();
        assert!(!sort.column_active_and_sorted_from_end(1, &columns));
        sort.click_column(1, false, &columns).unwrap();
        let mode = sort.sorter().and_then(Sorter::primary).map(|l| l.mode);
        assert_eq!(
            mode,
            Some(CompareMode {
                from_end: true,
                by_length: true
            })
        );
    }

    #[test]
    fn test_from_end_reported_for_non_last_composite_leaf() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        sort.click_column(1, false, &columns).unwrap();
        sort.toggle_sorted_from_end(1, &columns).unwrap();
        sort.click_column(2, true, &columns).unwrap();

        assert!(sort.sorter().is_some_and(Sorter::is_composite));
        assert_eq!(sort.current_column(), Some(&ColumnId::from("c")));
        assert!(sort.column_active_and_sorted_from_end(1, &columns));
        assert!(!sort.column_active_and_sorted_from_end(2, &columns));
        assert!(!sort.column_active_and_sorted_from_end(0, &columns));
        assert!(!sort.column_active_and_sorted_from_end(9, &columns));
    }

    #[test]
    fn test_sort_items() {
        let columns = registry();
        let mut sort = SortCoordinator::new();
        let mut items: Vec<ItemId> = (0..4).map(ItemId).collect();

        sort.click_column(0, false, &columns).unwrap();
        sort.sort_items(&mut items, &columns);
        let words: Vec<&str> = items.iter().map(|i| WORDS[i.0 as usize]).collect();
        assert_eq!(words, ["apple", "fig", "kiwi", "pear"]);

        sort.click_column(1, false, &columns).unwrap();
        sort.click_column(0, true, &columns).unwrap();
        sort.click_column(0, true, &columns).unwrap();
        sort.sort_items(&mut items, &columns);
        let words: Vec<&str> = items.iter().map(|i| WORDS[i.0 as usize]).collect();
        assert_eq!(words, ["pear", "apple", "kiwi", "fig"]);
    }
}
