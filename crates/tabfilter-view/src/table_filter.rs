#![forbid(unsafe_code)]

//! Root filter binding a composition to a [`FilteredView`].
//!
//! # Design
//!
//! [`TableFilter`] owns a root AND [`ComposedFilter`] and observes it. Every
//! root change becomes a [`NotificationGate`] request; firing the gate pushes
//! the root predicate into the attached view via
//! [`FilteredView::set_row_filter`]. While no view is attached the fire
//! reports the notification as still pending, so attaching a view later
//! delivers it.
//!
//! # Invariants
//!
//! 1. Between `enable_notifications(false)` and the matching
//!    `enable_notifications(true)`, the view is rescanned at most once, on
//!    the final enable, and only if the root changed.
//! 2. A root without active members is pushed as "no predicate".
//!
//! # Failure Modes
//!
//! - **Unbalanced disables**: the view never sees further changes until
//!   [`TableFilter::send_pending_notifications`] is called.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tabfilter_core::{
    ComposedFilter, FilterObservable, FilterObserver, FilterRef, NotificationGate, ObservableId,
    SharedObservable, SubscriptionId,
};
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::view::FilteredView;

/// Root AND filter with batched delivery to a view.
pub struct TableFilter {
    root: Rc<ComposedFilter>,
    gate: NotificationGate,
    view: RefCell<Option<FilteredView>>,
    root_subscription: Cell<Option<SubscriptionId>>,
}

impl fmt::Debug for TableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableFilter")
            .field("root", &self.root)
            .field("gate", &self.gate)
            .field("has_view", &self.view.borrow().is_some())
            .finish()
    }
}

/// Routes root changes into the owning filter's gate.
struct RootObserver {
    owner: Weak<TableFilter>,
}

impl FilterObserver for RootObserver {
    fn filter_updated(&self, _: ObservableId, _: Option<FilterRef>) {
        if let Some(owner) = self.owner.upgrade() {
            owner.gate.notify(false);
        }
    }
}

impl TableFilter {
    /// Table filter without a view.
    #[must_use]
    pub fn new() -> Rc<Self> {
        let table_filter = Rc::new_cyclic(|weak: &Weak<Self>| {
            let owner = weak.clone();
            Self {
                root: ComposedFilter::and(),
                gate: NotificationGate::new(move || {
                    owner.upgrade().is_none_or(|owner| owner.push_filter())
                }),
                view: RefCell::new(None),
                root_subscription: Cell::new(None),
            }
        });
        let observer = Rc::new(RootObserver {
            owner: Rc::downgrade(&table_filter),
        });
        let subscription = table_filter.root.subscribe(observer);
        table_filter.root_subscription.set(Some(subscription));
        table_filter
    }

    /// Table filter driving `view`.
    #[must_use]
    pub fn with_view(view: FilteredView) -> Rc<Self> {
        let table_filter = Self::new();
        table_filter.attach_view(view);
        table_filter
    }

    /// The root composition.
    #[must_use]
    pub fn filter(&self) -> &Rc<ComposedFilter> {
        &self.root
    }

    #[must_use]
    pub fn view(&self) -> Option<FilteredView> {
        self.view.borrow().clone()
    }

    /// Bind `view`, replacing any previous one, and request delivery of the
    /// current predicate through the gate.
    ///
    /// A replaced view keeps its last predicate.
    pub fn attach_view(&self, view: FilteredView) -> Option<FilteredView> {
        let previous = self.view.borrow_mut().replace(view);
        #[cfg(feature = "tracing")]
        debug!(message = "table_filter.attach", replaced = previous.is_some());
        self.gate.notify(false);
        previous
    }

    /// Unbind the view, clearing its predicate.
    pub fn detach_view(&self) -> Option<FilteredView> {
        let previous = self.view.borrow_mut().take();
        if let Some(view) = &previous {
            #[cfg(feature = "tracing")]
            debug!(message = "table_filter.detach");
            view.set_row_filter(None);
        }
        previous
    }

    pub fn add_observable(&self, source: SharedObservable) {
        self.root.add_observable(source);
    }

    pub fn add_observables(&self, sources: impl IntoIterator<Item = SharedObservable>) {
        self.root.add_observables(sources);
    }

    pub fn remove_observable(&self, id: ObservableId) -> bool {
        self.root.remove_observable(id)
    }

    /// Open (`true`) or close (`false`) one level of notification batching.
    ///
    /// Returns whether notifications currently flow.
    pub fn enable_notifications(&self, enable: bool) -> bool {
        self.gate.set_enabled(enable)
    }

    /// Deliver a pending notification even while batching.
    pub fn send_pending_notifications(&self) {
        self.gate.flush_pending();
    }

    #[must_use]
    pub fn has_pending_notifications(&self) -> bool {
        self.gate.is_pending()
    }

    /// Returns whether the notification must stay pending.
    fn push_filter(&self) -> bool {
        let Some(view) = self.view() else {
            return true;
        };
        let filter = if self.root.active_count() == 0 {
            None
        } else {
            self.root.as_filter()
        };
        view.set_row_filter(filter);
        false
    }
}

impl Drop for TableFilter {
    fn drop(&mut self) {
        if let Some(subscription) = self.root_subscription.take() {
            self.root.unsubscribe(subscription);
        }
        // Sever the root from its sources so it can be freed.
        self.root.clear();
    }
}
