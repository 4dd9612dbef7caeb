#![forbid(unsafe_code)]

//! Atomic leaf filter driven by application code.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::entry::{Entry, FilterRef, filter_fn};
use crate::observer::{FilterObservable, ObservableId, ObserverSet};

/// A leaf observable holding an optional predicate and an enabled flag.
///
/// The leaf contributes its predicate only while enabled and set; otherwise
/// it contributes nothing (`None`). Observers are notified whenever the
/// contribution changes, except for absent→absent transitions.
pub struct UserFilter {
    id: ObservableId,
    observers: ObserverSet,
    filter: RefCell<Option<FilterRef>>,
    enabled: Cell<bool>,
}

impl fmt::Debug for UserFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFilter")
            .field("id", &self.id)
            .field("has_filter", &self.filter.borrow().is_some())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}

impl UserFilter {
    /// Enabled leaf with no predicate.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: ObservableId::next(),
            observers: ObserverSet::new(),
            filter: RefCell::new(None),
            enabled: Cell::new(true),
        })
    }

    #[must_use]
    pub fn with_filter(filter: FilterRef) -> Rc<Self> {
        let leaf = Self::new();
        *leaf.filter.borrow_mut() = Some(filter);
        leaf
    }

    #[must_use]
    pub fn from_fn<F>(f: F) -> Rc<Self>
    where
        F: Fn(&dyn Entry) -> bool + 'static,
    {
        Self::with_filter(filter_fn(f))
    }

    /// Replace the predicate.
    pub fn set_filter(&self, filter: Option<FilterRef>) {
        let before = self.contributes();
        *self.filter.borrow_mut() = filter;
        self.changed(before);
    }

    /// Toggle whether the predicate is contributed.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.replace(enabled) == enabled {
            return;
        }
        #[cfg(feature = "tracing")]
        debug!(message = "filter.user.enabled", id = self.id.raw(), enabled);
        let contributed_before = !enabled && self.filter.borrow().is_some();
        self.changed(contributed_before);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Drop every downstream observer.
    pub fn detach(&self) {
        self.observers.clear();
    }

    fn contributes(&self) -> bool {
        self.enabled.get() && self.filter.borrow().is_some()
    }

    fn changed(&self, contributed_before: bool) {
        if contributed_before || self.contributes() {
            self.report_filter_updated();
        }
    }
}

impl FilterObservable for UserFilter {
    fn observable_id(&self) -> ObservableId {
        self.id
    }

    fn observers(&self) -> &ObserverSet {
        &self.observers
    }

    fn current_filter(&self) -> Option<FilterRef> {
        if self.enabled.get() {
            self.filter.borrow().clone()
        } else {
            None
        }
    }
}
