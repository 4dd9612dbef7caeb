//! Benchmarks for view rescans and reverse lookups.
//!
//! Run with: cargo bench -p tabfilter-view

use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tabfilter_core::{CellValue, ComposedFilter, Entry, FilterRef, UserFilter, filter_fn};
use tabfilter_view::{FilteredView, ModelEvent, VecTableModel};

fn view_of(rows: i64) -> (Rc<RefCell<VecTableModel>>, FilteredView) {
    let model = Rc::new(RefCell::new(VecTableModel::from_ints("n", 0..rows)));
    let view = FilteredView::new(model.clone());
    (model, view)
}

fn every_third() -> FilterRef {
    filter_fn(|e: &dyn Entry| {
        e.value(0)
            .and_then(CellValue::as_int)
            .is_some_and(|v| v % 3 == 0)
    })
}

fn bench_set_row_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/set_row_filter");

    for rows in [100, 1_000, 10_000, 100_000] {
        let (_, view) = view_of(rows);
        let filter = every_third();
        group.bench_with_input(BenchmarkId::new("closure", rows), &view, |b, view| {
            b.iter(|| view.set_row_filter(black_box(Some(Rc::clone(&filter)))))
        });
    }

    group.finish();
}

fn bench_composed_rescan(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/composed_rescan");

    for members in [1, 4, 16] {
        let (_, view) = view_of(10_000);
        let and = ComposedFilter::and();
        let leaves: Vec<_> = (0..members)
            .map(|m| {
                let leaf = UserFilter::from_fn(move |e| {
                    e.value(0).and_then(CellValue::as_int) != Some(m)
                });
                and.add_observable(leaf.clone());
                leaf
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("and", members), &view, |b, view| {
            b.iter(|| view.set_row_filter(and.as_filter()))
        });
        drop(leaves);
        and.clear();
    }

    group.finish();
}

fn bench_insert_rescan(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/insert");
    let (model, view) = view_of(10_000);
    view.set_row_filter(Some(every_third()));

    group.bench_function("insert_then_delete", |b| {
        b.iter(|| {
            let inserted = model
                .borrow_mut()
                .insert_row(5_000, vec![Some(CellValue::Int(3))]);
            view.model_changed(&inserted);
            if let Some((_, deleted)) = model.borrow_mut().remove_row(5_000) {
                view.model_changed(&deleted);
            }
        })
    });

    group.finish();
}

fn bench_view_index_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/view_index_of");
    let (_, view) = view_of(100_000);
    view.set_row_filter(Some(every_third()));

    group.bench_function("warm", |b| {
        let _ = view.view_index_of(0);
        b.iter(|| black_box(view.view_index_of(black_box(60_000))))
    });
    group.bench_function("cold", |b| {
        b.iter(|| {
            view.model_changed(&ModelEvent::all_rows_updated());
            black_box(view.view_index_of(black_box(60_000)))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set_row_filter,
    bench_composed_rescan,
    bench_insert_rescan,
    bench_view_index_of
);
criterion_main!(benches);
