#![forbid(unsafe_code)]

//! Property-based invariant tests for the view/model index mapping.
//!
//! 1. Visible rows are exactly the passing model rows, ascending.
//! 2. view_index_of(model_index_of(v)) == Some(v) for every visible v.
//! 3. Filtered-out model rows map to None.
//! 4. Every insert/delete sequence leaves the mapping consistent with a
//!    fresh view over the same data.
//! 5. Out-of-range indices are errors, never clamped.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use tabfilter_core::{CellValue, Entry, FilterRef, filter_fn};
use tabfilter_view::{FilteredView, ModelEvent, TableModel, VecTableModel, ViewError};

// ── Strategies ──────────────────────────────────────────────────────────

fn values() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(-20i64..20, 0..60)
}

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, i64),
    Delete(usize),
    Update(usize, i64),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        (any::<usize>(), -20i64..20).prop_map(|(i, v)| Op::Insert(i, v)),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), -20i64..20).prop_map(|(i, v)| Op::Update(i, v)),
    ];
    proptest::collection::vec(op, 0..25)
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn modulo(m: i64) -> FilterRef {
    filter_fn(move |e: &dyn Entry| {
        e.value(0)
            .and_then(CellValue::as_int)
            .is_some_and(|v| v.rem_euclid(m) == 0)
    })
}

fn expected(values: &[i64], m: i64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.rem_euclid(m) == 0)
        .map(|(i, _)| i)
        .collect()
}

fn current_values(model: &RefCell<VecTableModel>) -> Vec<i64> {
    let model = model.borrow();
    (0..model.row_count())
        .map(|r| {
            model
                .value_at(r, 0)
                .and_then(CellValue::as_int)
                .unwrap_or_default()
        })
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Mapping after a rescan
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_rows_are_passing_rows_in_order(values in values(), m in 1i64..5) {
        let model = Rc::new(RefCell::new(VecTableModel::from_ints("n", values.clone())));
        let view = FilteredView::new(model);
        view.set_row_filter(Some(modulo(m)));

        let indices = view.model_indices();
        prop_assert_eq!(&indices, &expected(&values, m));
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(view.row_count(), indices.len());
    }

    #[test]
    fn inverse_is_consistent(values in values(), m in 1i64..5) {
        let model = Rc::new(RefCell::new(VecTableModel::from_ints("n", values.clone())));
        let view = FilteredView::new(model);
        view.set_row_filter(Some(modulo(m)));

        for v in 0..view.row_count() {
            let model_index = view.model_index_of(v).expect("visible row");
            prop_assert_eq!(view.view_index_of(model_index), Ok(Some(v)));
        }
        for (i, value) in values.iter().enumerate() {
            if value.rem_euclid(m) != 0 {
                prop_assert_eq!(view.view_index_of(i), Ok(None));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Mutation sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mutations_match_fresh_view(values in values(), ops in ops(), m in 1i64..4) {
        let model = Rc::new(RefCell::new(VecTableModel::from_ints("n", values)));
        let view = FilteredView::new(model.clone());
        view.set_row_filter(Some(modulo(m)));
        // Interleave reverse lookups so that stale inverses would be caught.
        let _ = view.view_index_of(0);

        for op in ops {
            let len = model.borrow().row_count();
            let event = match op {
                Op::Insert(i, v) => {
                    let row = vec![Some(CellValue::Int(v))];
                    Some(model.borrow_mut().insert_row(i % (len + 1), row))
                }
                Op::Delete(i) if len > 0 => {
                    model.borrow_mut().remove_row(i % len).map(|(_, e)| e)
                }
                // Bounded updates are passed through untested, so report
                // the change as unbounded to force a rescan.
                Op::Update(i, v) if len > 0 => model
                    .borrow_mut()
                    .set_cell(i % len, 0, Some(CellValue::Int(v)))
                    .map(|_| ModelEvent::all_rows_updated()),
                _ => None,
            };
            if let Some(event) = event {
                view.model_changed(&event);
            }
            let _ = view.view_index_of(0);
        }

        let values = current_values(&model);
        prop_assert_eq!(view.model_indices(), expected(&values, m));
        for v in 0..view.row_count() {
            let model_index = view.model_index_of(v).expect("visible row");
            prop_assert_eq!(view.view_index_of(model_index), Ok(Some(v)));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Range errors
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn out_of_range_is_reported(values in values(), m in 1i64..5, extra in 0usize..10) {
        let model = Rc::new(RefCell::new(VecTableModel::from_ints("n", values.clone())));
        let view = FilteredView::new(model);
        view.set_row_filter(Some(modulo(m)));

        let visible = view.row_count();
        prop_assert_eq!(
            view.model_index_of(visible + extra),
            Err(ViewError::ViewIndexOutOfRange { index: visible + extra, len: visible })
        );
        prop_assert_eq!(
            view.view_index_of(values.len() + extra),
            Err(ViewError::ModelIndexOutOfRange { index: values.len() + extra, len: values.len() })
        );
    }
}
