//! End-to-end: leaf filters composed under a table filter driving a view.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tabfilter_core::{
    CellValue, Combinator, ComposedFilter, Entry, FilterObservable, SharedObservable, UserFilter,
};
use tabfilter_view::{FilteredView, TableFilter, VecTableModel, ViewEvent};
#[cfg(feature = "tracing")]
use tracing_test::traced_test;

fn int_at(e: &dyn Entry) -> i64 {
    e.value(0).and_then(CellValue::as_int).unwrap_or_default()
}

fn counted_view(values: impl IntoIterator<Item = i64>) -> (FilteredView, Rc<Cell<u32>>) {
    let model = Rc::new(RefCell::new(VecTableModel::from_ints("n", values)));
    let view = FilteredView::new(model);
    let changes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&changes);
    view.subscribe(move |event| {
        if *event == ViewEvent::DataChanged {
            counter.set(counter.get() + 1);
        }
    });
    (view, changes)
}

#[test]
fn or_with_one_active_member_degenerates_to_it() {
    let (view, _) = counted_view(0..6);
    let table_filter = TableFilter::with_view(view.clone());

    let absent = UserFilter::new();
    let only_three = UserFilter::from_fn(|e| int_at(e) == 3);
    let or = ComposedFilter::with_observables(
        Combinator::Or,
        [
            absent.clone() as SharedObservable,
            only_three.clone() as SharedObservable,
        ],
    );
    table_filter.add_observable(or.clone());

    assert_eq!(view.model_indices(), vec![3]);
    assert_eq!(view.view_index_of(3), Ok(Some(0)));
    assert_eq!(view.view_index_of(1), Ok(None));
}

#[test]
fn nested_composition_propagates_to_the_view() {
    let (view, changes) = counted_view(0..20);
    let table_filter = TableFilter::with_view(view.clone());
    let base = changes.get();

    let even = UserFilter::from_fn(|e| int_at(e) % 2 == 0);
    let big = UserFilter::from_fn(|e| int_at(e) >= 10);
    let not_big = ComposedFilter::not(big.clone());
    let and = ComposedFilter::with_observables(
        Combinator::And,
        [even.clone() as SharedObservable, not_big.clone() as SharedObservable],
    );

    table_filter.enable_notifications(false);
    table_filter.add_observable(and.clone());
    table_filter.enable_notifications(true);
    assert_eq!(changes.get(), base + 1);
    assert_eq!(view.model_indices(), vec![0, 2, 4, 6, 8]);

    big.set_enabled(false);
    assert_eq!(changes.get(), base + 2);
    assert_eq!(view.row_count(), 10);

    // Re-enabling an already-enabled leaf changes nothing.
    even.set_enabled(true);
    assert_eq!(changes.get(), base + 2);
}

#[test]
fn removing_an_inactive_source_does_not_rescan() {
    let (view, changes) = counted_view(0..5);
    let table_filter = TableFilter::with_view(view);
    let idle = UserFilter::new();
    table_filter.add_observable(idle.clone());
    let base = changes.get();

    assert!(table_filter.remove_observable(idle.observable_id()));
    assert_eq!(changes.get(), base);
    assert!(!table_filter.remove_observable(idle.observable_id()));
}

#[cfg(feature = "tracing")]
#[test]
#[traced_test]
fn rescans_and_gate_fires_are_logged() {
    let (view, _) = counted_view(0..3);
    let table_filter = TableFilter::with_view(view.clone());
    table_filter.add_observable(UserFilter::from_fn(|e| int_at(e) > 0));
    let _ = view.view_index_of(0);

    assert!(logs_contain("view.rescan"));
    assert!(logs_contain("gate.fire"));
    assert!(logs_contain("view.inverse.build"));
}
