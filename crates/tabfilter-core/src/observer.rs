#![forbid(unsafe_code)]

//! Publish/subscribe channel between filters.
//!
//! # Design
//!
//! Every observable filter owns an [`ObserverSet`]. Observers are stored as
//! strong `Rc<dyn FilterObserver>` handles keyed by a [`SubscriptionId`]
//! issued at subscribe time, so removal never depends on pointer identity.
//!
//! There is a single message kind, [`FilterObserver::filter_updated`], which
//! carries the producer's [`ObservableId`] and its current predicate (`None`
//! when the producer contributes nothing).
//!
//! # Invariants
//!
//! 1. [`FilterObservable::subscribe`] emits exactly one notification,
//!    carrying the current predicate, to every observer in the set,
//!    including the new one.
//! 2. Unsubscribing is silent.
//! 3. [`ObserverSet::emit`] iterates a snapshot: observers removed or added
//!    during delivery do not affect the in-flight pass, and every observer
//!    present at the start is invoked exactly once.
//!
//! # Failure Modes
//!
//! - **Retention cycle**: a source holds its observers strongly. An observer
//!   that is never unsubscribed stays alive as long as the source does.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::entry::FilterRef;

static NEXT_OBSERVABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an observable filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservableId(u64);

impl ObservableId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OBSERVABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Receiver of predicate-change notifications.
pub trait FilterObserver {
    /// `producer` now contributes `filter` (`None` = contributes nothing).
    fn filter_updated(&self, producer: ObservableId, filter: Option<FilterRef>);
}

/// The recipient set of one observable.
#[derive(Default)]
pub struct ObserverSet {
    observers: RefCell<Vec<(SubscriptionId, Rc<dyn FilterObserver>)>>,
    next_subscription: Cell<u64>,
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("len", &self.len())
            .finish()
    }
}

impl ObserverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer without notifying it.
    pub fn insert(&self, observer: Rc<dyn FilterObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.observers.borrow_mut().push((id, observer));
        id
    }

    /// Remove the observer registered under `id`. Returns whether it existed.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut observers = self.observers.borrow_mut();
            let pos = observers.iter().position(|(sub, _)| *sub == id);
            pos.map(|pos| observers.remove(pos))
        };
        // Dropped here, outside the borrow.
        removed.is_some()
    }

    /// Deliver `filter` from `producer` to every current observer.
    pub fn emit(&self, producer: ObservableId, filter: Option<FilterRef>) {
        let snapshot: Vec<Rc<dyn FilterObserver>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in snapshot {
            observer.filter_updated(producer, filter.clone());
        }
    }

    /// Drop every observer.
    pub fn clear(&self) {
        // Take first so that observer drops cannot re-enter a live borrow.
        let dropped = std::mem::take(&mut *self.observers.borrow_mut());
        drop(dropped);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An entity whose predicate can change over time and that can be watched.
pub trait FilterObservable {
    fn observable_id(&self) -> ObservableId;

    /// The recipient set owned by this observable.
    fn observers(&self) -> &ObserverSet;

    /// Predicate currently contributed, `None` when contributing nothing.
    fn current_filter(&self) -> Option<FilterRef>;

    /// Register `observer` and immediately broadcast the current predicate.
    fn subscribe(&self, observer: Rc<dyn FilterObserver>) -> SubscriptionId {
        let id = self.observers().insert(observer);
        self.report_filter_updated();
        id
    }

    /// Remove a subscription silently.
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers().remove(id)
    }

    /// Send the current predicate to every observer.
    fn report_filter_updated(&self) {
        self.observers()
            .emit(self.observable_id(), self.current_filter());
    }
}

/// Type-erased shared observable.
pub type SharedObservable = Rc<dyn FilterObservable>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::filter_fn;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(ObservableId, bool)>>,
    }

    impl FilterObserver for Recorder {
        fn filter_updated(&self, producer: ObservableId, filter: Option<FilterRef>) {
            self.seen.borrow_mut().push((producer, filter.is_some()));
        }
    }

    struct Fixed {
        id: ObservableId,
        observers: ObserverSet,
        filter: Option<FilterRef>,
    }

    impl FilterObservable for Fixed {
        fn observable_id(&self) -> ObservableId {
            self.id
        }
        fn observers(&self) -> &ObserverSet {
            &self.observers
        }
        fn current_filter(&self) -> Option<FilterRef> {
            self.filter.clone()
        }
    }

    fn fixed(filter: Option<FilterRef>) -> Fixed {
        Fixed {
            id: ObservableId::next(),
            observers: ObserverSet::new(),
            filter,
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = ObservableId::next();
        let b = ObservableId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn subscribe_sends_initial_sync() {
        let source = fixed(Some(filter_fn(|_| true)));
        let rec = Rc::new(Recorder::default());
        source.subscribe(rec.clone());
        assert_eq!(*rec.seen.borrow(), vec![(source.id, true)]);
    }

    #[test]
    fn initial_sync_reaches_existing_observers() {
        let source = fixed(None);
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());
        source.subscribe(first.clone());
        source.subscribe(second.clone());
        assert_eq!(
            *first.seen.borrow(),
            vec![(source.id, false), (source.id, false)]
        );
        assert_eq!(*second.seen.borrow(), vec![(source.id, false)]);
    }

    #[test]
    fn unsubscribe_is_silent() {
        let source = fixed(None);
        let rec = Rc::new(Recorder::default());
        let id = source.subscribe(rec.clone());
        assert!(source.unsubscribe(id));
        assert!(!source.unsubscribe(id));
        source.report_filter_updated();
        assert_eq!(rec.seen.borrow().len(), 1);
        assert!(source.observers().is_empty());
    }

    struct SelfRemover {
        set: Rc<ObserverSet>,
        own: Cell<Option<SubscriptionId>>,
        others: Vec<SubscriptionId>,
        calls: Cell<u32>,
    }

    impl FilterObserver for SelfRemover {
        fn filter_updated(&self, _: ObservableId, _: Option<FilterRef>) {
            self.calls.set(self.calls.get() + 1);
            if let Some(own) = self.own.get() {
                self.set.remove(own);
            }
            for other in &self.others {
                self.set.remove(*other);
            }
        }
    }

    #[test]
    fn unsubscribe_during_emit_keeps_snapshot() {
        let set = Rc::new(ObserverSet::new());
        let tail = Rc::new(Recorder::default());
        let tail_id = set.insert(tail.clone());
        let remover = Rc::new(SelfRemover {
            set: Rc::clone(&set),
            own: Cell::new(None),
            others: vec![tail_id],
            calls: Cell::new(0),
        });
        let remover_id = set.insert(remover.clone());
        remover.own.set(Some(remover_id));

        set.emit(ObservableId::next(), None);

        // Both were in the snapshot, so both ran exactly once.
        assert_eq!(remover.calls.get(), 1);
        assert_eq!(tail.seen.borrow().len(), 1);
        assert!(set.is_empty());

        set.emit(ObservableId::next(), None);
        assert_eq!(remover.calls.get(), 1);
    }

    #[test]
    fn clear_drops_all() {
        let set = ObserverSet::new();
        set.insert(Rc::new(Recorder::default()));
        set.insert(Rc::new(Recorder::default()));
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }
}
