#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabfilter_core::{CellValue, Entry, filter_fn};
use tabfilter_view::{
    FilteredView, ModelEvent, TableModel, UpdatePolicy, VecTableModel, ViewConfig,
};

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { at: u8, value: i8 },
    Delete { at: u8 },
    Update { at: u8, value: i8, bounded: bool },
    SetModulo(u8),
    ClearFilter,
    Lookup(u8),
}

fuzz_target!(|input: (bool, Vec<i8>, Vec<Op>)| {
    let (refilter, values, ops) = input;
    let policy = if refilter {
        UpdatePolicy::Refilter
    } else {
        UpdatePolicy::PassThrough
    };
    let model = Rc::new(RefCell::new(VecTableModel::from_ints(
        "n",
        values.iter().map(|&v| i64::from(v)),
    )));
    let view = FilteredView::with_config(
        model.clone(),
        ViewConfig::default().with_update_policy(policy),
    );

    for op in ops.into_iter().take(256) {
        let len = model.borrow().row_count();
        let event = match op {
            Op::Insert { at, value } => {
                let row = vec![Some(CellValue::Int(i64::from(value)))];
                Some(model.borrow_mut().insert_row(usize::from(at), row))
            }
            Op::Delete { at } if len > 0 => model
                .borrow_mut()
                .remove_row(usize::from(at) % len)
                .map(|(_, e)| e),
            Op::Update { at, value, bounded } if len > 0 => {
                let row = usize::from(at) % len;
                let cell = Some(CellValue::Int(i64::from(value)));
                let event = model.borrow_mut().set_cell(row, 0, cell);
                if bounded {
                    event
                } else {
                    event.map(|_| ModelEvent::all_rows_updated())
                }
            }
            Op::SetModulo(m) => {
                let m = i64::from(m.max(1));
                view.set_row_filter(Some(filter_fn(move |e: &dyn Entry| {
                    e.value(0)
                        .and_then(CellValue::as_int)
                        .is_some_and(|v| v.rem_euclid(m) == 0)
                })));
                None
            }
            Op::ClearFilter => {
                view.set_row_filter(None);
                None
            }
            Op::Lookup(i) => {
                let _ = view.view_index_of(usize::from(i));
                let _ = view.model_index_of(usize::from(i));
                None
            }
            _ => None,
        };
        if let Some(event) = event {
            view.model_changed(&event);
        }

        let indices = view.model_indices();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&m| m < view.model_row_count()));
        for (v, &m) in indices.iter().enumerate() {
            assert_eq!(view.view_index_of(m), Ok(Some(v)));
        }
    }
});
