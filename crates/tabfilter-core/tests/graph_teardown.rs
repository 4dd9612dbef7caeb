//! Teardown behavior of the filter graph.
//!
//! Sources hold observers strongly, so a composed filter that is dropped
//! without being cleared stays alive and subscribed. These tests pin both the
//! leak and the explicit teardown that avoids it.

use std::rc::Rc;

use tabfilter_core::{Combinator, ComposedFilter, FilterObservable, SharedObservable, UserFilter};
#[cfg(feature = "tracing")]
use tracing_test::traced_test;

#[test]
fn dropped_composition_stays_subscribed() {
    let source = UserFilter::from_fn(|_| true);
    let composed = ComposedFilter::and();
    composed.add_observable(source.clone());
    let weak = Rc::downgrade(&composed);

    drop(composed);

    // Still retained through the source's observer set.
    assert!(weak.upgrade().is_some());
    assert_eq!(source.observers().len(), 1);

    // Changes on the source still reach the orphaned composition.
    source.set_enabled(false);
    assert_eq!(weak.upgrade().map(|c| c.active_count()), Some(0));

    // Late cleanup through the surviving handle frees it.
    if let Some(orphan) = weak.upgrade() {
        orphan.clear();
    }
    assert!(weak.upgrade().is_none());
    assert!(source.observers().is_empty());
}

#[test]
fn clear_then_drop_frees_composition() {
    let a = UserFilter::from_fn(|_| true);
    let b = UserFilter::new();
    let composed = ComposedFilter::with_observables(
        Combinator::Or,
        [a.clone() as SharedObservable, b.clone() as SharedObservable],
    );
    let weak = Rc::downgrade(&composed);

    composed.clear();
    composed.detach();
    drop(composed);

    assert!(weak.upgrade().is_none());
    assert!(a.observers().is_empty());
    assert!(b.observers().is_empty());
}

#[test]
fn detach_alone_does_not_sever_upstream() {
    let source = UserFilter::new();
    let composed = ComposedFilter::and();
    composed.add_observable(source.clone());
    let weak = Rc::downgrade(&composed);

    composed.detach();
    drop(composed);

    assert!(weak.upgrade().is_some());
    assert_eq!(source.observers().len(), 1);

    if let Some(orphan) = weak.upgrade() {
        orphan.remove_observable(source.observable_id());
    }
    assert!(weak.upgrade().is_none());
}

#[cfg(feature = "tracing")]
#[test]
#[traced_test]
fn composition_changes_are_logged() {
    let source = UserFilter::from_fn(|_| false);
    let composed = ComposedFilter::and();
    composed.add_observable(source.clone());
    composed.remove_observable(source.observable_id());

    assert!(logs_contain("filter.compose.add"));
    assert!(logs_contain("filter.compose.remove"));
}
