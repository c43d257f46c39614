//! Integration tests for column structure and sorter consistency.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use horizon_browse::{
    BrowseError, BrowseList, BrowseOptions, CellFilter, ColumnId, ColumnSpec, Filter, ItemId,
    ItemSource, LeafSorter, PersistedStore, Settings, SortOrder, Sorter, SourceToken,
};
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("horizon_browse=debug")
        .try_init();
}

struct Rows(Vec<ItemId>);

impl ItemSource for Rows {
    fn current_items(&self) -> Vec<ItemId> {
        self.0.clone()
    }

    fn list_source_token(&self) -> SourceToken {
        SourceToken(1)
    }

    fn map_to_relatives(&self, _items: &HashSet<ItemId>) -> HashMap<ItemId, Vec<ItemId>> {
        HashMap::new()
    }
}

fn catalog() -> Vec<ColumnSpec> {
    ["a", "b", "c"]
        .into_iter()
        .map(|id| {
            ColumnSpec::new(id, id.to_uppercase()).with_sort_key(move |item| format!("{id}{}", item.0))
        })
        .chain([ColumnSpec::new("d", "D").with_sort_key(|item| item.0.to_string()).visible(false)])
        .collect()
}

fn list_with(store: Arc<Settings>) -> BrowseList {
    BrowseList::builder(
        BrowseOptions::new("lexicon"),
        catalog(),
        Arc::new(Rows((1..=4).map(ItemId).collect())),
    )
    .store(store)
    .build()
    .unwrap()
}

fn list() -> BrowseList {
    list_with(Arc::new(Settings::new()))
}

fn leaf(column: &str, order: SortOrder) -> LeafSorter {
    LeafSorter::new(column, order)
}

#[test]
fn test_at_least_one_column_always_remains() {
    init_tracing();
    let mut list = list();

    for step in 0..12 {
        match step % 4 {
            0 => {
                let _ = list.remove_column(0);
            }
            1 => {
                let _ = list.remove_column(5);
            }
            2 => {
                let n = list.columns().len();
                let mapping: Vec<usize> = (0..n).rev().collect();
                list.reorder_columns(&mapping).unwrap();
            }
            _ => {
                let _ = list.remove_column(list.columns().len().saturating_sub(1));
            }
        }
        assert!(!list.columns().is_empty());
    }

    assert_eq!(list.columns().len(), 1);
    assert!(matches!(list.remove_column(0), Err(BrowseError::LastColumn)));
    assert_eq!(list.columns().len(), 1);
}

#[test]
fn test_removing_sorted_column_leaves_no_dangling_sorter() {
    let mut list = list();
    list.apply_sorter(
        Some(Sorter::Composite(vec![
            leaf("b", SortOrder::Descending),
            leaf("c", SortOrder::Ascending),
        ])),
        false,
    );

    list.remove_column(1).unwrap();

    let sorter = list.sort().sorter().cloned().unwrap();
    for leaf in sorter.leaves() {
        assert!(list.columns().is_showing(&leaf.column));
    }
    assert_eq!(sorter, Sorter::Leaf(leaf("c", SortOrder::Ascending)));

    list.remove_column(1).unwrap();
    assert_eq!(
        list.sort().sorter(),
        Some(&Sorter::Leaf(leaf("a", SortOrder::Ascending)))
    );
}

#[test]
fn test_double_click_restores_direction() {
    let mut list = list();
    list.click_column(1, false).unwrap();
    let before = list.sort().sorter().cloned();
    let rows_before = list.rows().to_vec();

    list.click_column(1, false).unwrap();
    assert_ne!(list.sort().sorter().cloned(), before);
    list.click_column(1, false).unwrap();

    assert_eq!(list.sort().sorter().cloned(), before);
    assert_eq!(list.rows(), rows_before.as_slice());
}

#[test]
fn test_composite_scenario() {
    let mut list = list();
    let emitted = Arc::new(Mutex::new(0));
    let emitted_clone = emitted.clone();
    list.sorter_changed()
        .connect(move |_| *emitted_clone.lock() += 1);

    list.click_column(1, false).unwrap();
    list.click_column(2, true).unwrap();
    assert_eq!(
        list.sort().sorter(),
        Some(&Sorter::Composite(vec![
            leaf("b", SortOrder::Ascending),
            leaf("c", SortOrder::Ascending),
        ]))
    );

    list.click_column(1, true).unwrap();
    assert_eq!(
        list.sort().sorter(),
        Some(&Sorter::Composite(vec![
            leaf("b", SortOrder::Descending),
            leaf("c", SortOrder::Ascending),
        ]))
    );
    assert_eq!(*emitted.lock(), 3);
    assert_eq!(list.rows(), &[ItemId(4), ItemId(3), ItemId(2), ItemId(1)]);
}

#[test]
fn test_reorder_keeps_sorter_on_same_columns() {
    let mut list = list();
    list.click_column(2, false).unwrap();
    list.toggle_sorted_from_end(2).unwrap();

    list.reorder_columns(&[2, 0, 1]).unwrap();

    let primary = list.sort().sorter().and_then(Sorter::primary).cloned().unwrap();
    assert_eq!(primary.column, ColumnId::from("c"));
    assert!(primary.mode.from_end);
    assert!(list.sort().column_active_and_sorted_from_end(0, list.columns()));
    assert_eq!(list.sort().sorted_columns(list.columns()), vec![0]);
}

#[test]
fn test_out_of_range_remove_leaves_registry_unchanged() {
    let mut list = list();
    list.resize_column(1, 140).unwrap();
    let ids = list.columns().ids();
    let widths = list.columns().widths();

    let result = list.remove_column(3);

    assert!(matches!(
        result,
        Err(BrowseError::InvalidColumnIndex { index: 3, len: 3 })
    ));
    assert_eq!(list.columns().ids(), ids);
    assert_eq!(list.columns().widths(), widths);
}

#[test]
fn test_invalid_permutation_rejected() {
    let mut list = list();
    let result = list.reorder_columns(&[0, 0, 1]);
    assert!(matches!(result, Err(BrowseError::InvalidPermutation { .. })));
    assert_eq!(
        list.columns().ids(),
        vec![ColumnId::from("a"), ColumnId::from("b"), ColumnId::from("c")]
    );
}

#[test]
fn test_width_and_layout_survive_reopening() {
    let store = Arc::new(Settings::new());
    {
        let mut list = list_with(store.clone());
        list.resize_column(2, 120).unwrap();
        list.toggle_column(&"d".into()).unwrap();
        list.reorder_columns(&[3, 0, 1, 2]).unwrap();
    }
    assert_eq!(store.get_int("lexicon_c_Width"), Some(120));

    let reopened = list_with(store);
    assert_eq!(
        reopened.columns().ids(),
        ["d", "a", "b", "c"].map(ColumnId::from).to_vec()
    );
    assert_eq!(reopened.columns().persisted_width(3).unwrap(), 120);
}

#[test]
fn test_column_notifications_once_per_operation() {
    let mut list = list();
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    list.columns_changed()
        .connect(move |width_only| received_clone.lock().push(*width_only));

    list.install_columns(&["c".into(), "d".into(), "a".into()]).unwrap();
    list.resize_column(0, 90).unwrap();
    let filter = Filter::new().with_cell(CellFilter::new("b", |_| true));
    list.update_filter_bar(Some(filter));

    assert_eq!(*received.lock(), vec![false, true, false]);
    assert_eq!(
        list.columns().ids(),
        ["c", "d", "a", "b"].map(ColumnId::from).to_vec()
    );
}

#[test]
fn test_install_without_sorted_column_degrades_sorter() {
    let mut list = list();
    list.click_column(1, false).unwrap();

    let install = list.install_columns(&["d".into(), "c".into()]).unwrap();

    assert!(install.removed_any);
    assert_eq!(
        list.sort().sorter(),
        Some(&Sorter::Leaf(leaf("d", SortOrder::Ascending)))
    );
}
