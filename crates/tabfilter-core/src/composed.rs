#![forbid(unsafe_code)]

//! Logical composition (AND / OR / NOT) over a dynamic set of observed filters.
//!
//! # Design
//!
//! A [`ComposedFilter`] is simultaneously:
//!
//! - a [`FilterObserver`] of every member observable,
//! - a [`FilterObservable`] for its own downstream observers, and
//! - a [`RowFilter`] whose decision is derived lazily from the members'
//!   last-known predicates.
//!
//! Members are kept in a `BTreeMap` keyed by [`ObservableId`]. A member's
//! stored predicate is only ever replaced by a notification carrying that
//! member's id; notifications from unknown producers are ignored.
//!
//! # Invariants
//!
//! 1. The key set equals the set of sources this filter is subscribed to.
//! 2. Adding an observable never notifies by itself; the source's initial
//!    sync drives any downstream update.
//! 3. Removing a member notifies only if it was contributing a predicate.
//! 4. An absent→absent update is suppressed.
//! 5. Members without a predicate are ignored by every combinator; with no
//!    active member every combinator passes all rows.
//!
//! # Failure Modes
//!
//! - **Retention leak**: sources hold their observers strongly and members
//!   hold their sources strongly. Dropping the last external handle of a
//!   composed filter that still has members does not free it; it stays
//!   registered on its sources. Call [`ComposedFilter::clear`] (and
//!   [`ComposedFilter::detach`] for the downstream side) before discarding.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::entry::{Entry, FilterRef, RowFilter};
use crate::observer::{
    FilterObservable, FilterObserver, ObservableId, ObserverSet, SharedObservable, SubscriptionId,
};

/// How member decisions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Every active member must pass.
    And,
    /// At least one active member must pass.
    Or,
    /// The conjunction of the active members must reject.
    Not,
}

struct Member {
    source: SharedObservable,
    /// `None` only while the initial subscribe call is in flight.
    subscription: Option<SubscriptionId>,
    filter: Option<FilterRef>,
}

/// Filter combining the predicates of the observables it watches.
pub struct ComposedFilter {
    id: ObservableId,
    combinator: Combinator,
    members: RefCell<BTreeMap<ObservableId, Member>>,
    observers: ObserverSet,
    self_ref: Weak<ComposedFilter>,
}

impl fmt::Debug for ComposedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedFilter")
            .field("id", &self.id)
            .field("combinator", &self.combinator)
            .field("members", &self.members.borrow().len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ComposedFilter {
    /// Create an empty composition.
    #[must_use]
    pub fn new(combinator: Combinator) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            id: ObservableId::next(),
            combinator,
            members: RefCell::new(BTreeMap::new()),
            observers: ObserverSet::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// Create a composition already watching `sources`.
    #[must_use]
    pub fn with_observables(
        combinator: Combinator,
        sources: impl IntoIterator<Item = SharedObservable>,
    ) -> Rc<Self> {
        let composed = Self::new(combinator);
        composed.add_observables(sources);
        composed
    }

    #[must_use]
    pub fn and() -> Rc<Self> {
        Self::new(Combinator::And)
    }

    #[must_use]
    pub fn or() -> Rc<Self> {
        Self::new(Combinator::Or)
    }

    /// Negation of a single source.
    #[must_use]
    pub fn not(source: SharedObservable) -> Rc<Self> {
        Self::with_observables(Combinator::Not, [source])
    }

    #[must_use]
    pub const fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Start watching `source`. Already-watched sources are skipped.
    pub fn add_observable(&self, source: SharedObservable) {
        let id = source.observable_id();
        if id == self.id {
            #[cfg(feature = "tracing")]
            debug!(message = "filter.compose.self_add", composed = self.id.raw());
            return;
        }
        {
            let mut members = self.members.borrow_mut();
            if members.contains_key(&id) {
                return;
            }
            members.insert(
                id,
                Member {
                    source: Rc::clone(&source),
                    subscription: None,
                    filter: None,
                },
            );
        }
        let Some(observer) = self.as_observer() else {
            return;
        };
        // The source answers synchronously with its current predicate.
        let subscription = source.subscribe(observer);
        let mut members = self.members.borrow_mut();
        if let Some(member) = members.get_mut(&id) {
            member.subscription = Some(subscription);
        } else {
            // Removed during the initial sync.
            drop(members);
            source.unsubscribe(subscription);
        }
        #[cfg(feature = "tracing")]
        debug!(
            message = "filter.compose.add",
            composed = self.id.raw(),
            source = id.raw()
        );
    }

    pub fn add_observables(&self, sources: impl IntoIterator<Item = SharedObservable>) {
        for source in sources {
            self.add_observable(source);
        }
    }

    /// Stop watching the source `id`. Returns whether it was a member.
    pub fn remove_observable(&self, id: ObservableId) -> bool {
        let removed = self.members.borrow_mut().remove(&id);
        let Some(member) = removed else {
            return false;
        };
        if let Some(subscription) = member.subscription {
            member.source.unsubscribe(subscription);
        }
        #[cfg(feature = "tracing")]
        debug!(
            message = "filter.compose.remove",
            composed = self.id.raw(),
            source = id.raw(),
            was_active = member.filter.is_some()
        );
        if member.filter.is_some() {
            self.report_filter_updated();
        }
        true
    }

    /// Stop watching every source, notifying at most once.
    pub fn clear(&self) {
        let members = std::mem::take(&mut *self.members.borrow_mut());
        let mut was_active = false;
        for member in members.into_values() {
            if let Some(subscription) = member.subscription {
                member.source.unsubscribe(subscription);
            }
            was_active |= member.filter.is_some();
        }
        if was_active {
            self.report_filter_updated();
        }
    }

    /// Drop every downstream observer.
    ///
    /// Upstream subscriptions are left intact; use [`ComposedFilter::clear`]
    /// to sever those as well.
    pub fn detach(&self) {
        self.observers.clear();
    }

    /// Ids of the watched sources, in id order.
    #[must_use]
    pub fn observables(&self) -> Vec<ObservableId> {
        self.members.borrow().keys().copied().collect()
    }

    #[must_use]
    pub fn contains(&self, id: ObservableId) -> bool {
        self.members.borrow().contains_key(&id)
    }

    /// Number of members currently contributing a predicate.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.members
            .borrow()
            .values()
            .filter(|m| m.filter.is_some())
            .count()
    }

    /// This filter as a shared predicate.
    #[must_use]
    pub fn as_filter(&self) -> Option<FilterRef> {
        self.self_ref.upgrade().map(|rc| rc as FilterRef)
    }

    fn as_observer(&self) -> Option<Rc<dyn FilterObserver>> {
        self.self_ref
            .upgrade()
            .map(|rc| rc as Rc<dyn FilterObserver>)
    }
}

impl RowFilter for ComposedFilter {
    fn include(&self, entry: &dyn Entry) -> bool {
        let members = self.members.borrow();
        let mut active = members.values().filter_map(|m| m.filter.as_ref()).peekable();
        if active.peek().is_none() {
            return true;
        }
        match self.combinator {
            Combinator::And => active.all(|f| f.include(entry)),
            Combinator::Or => active.any(|f| f.include(entry)),
            Combinator::Not => !active.all(|f| f.include(entry)),
        }
    }
}

impl FilterObserver for ComposedFilter {
    fn filter_updated(&self, producer: ObservableId, filter: Option<FilterRef>) {
        let changed = {
            let mut members = self.members.borrow_mut();
            let Some(member) = members.get_mut(&producer) else {
                #[cfg(feature = "tracing")]
                trace!(
                    message = "filter.compose.stale_notification",
                    composed = self.id.raw(),
                    producer = producer.raw()
                );
                return;
            };
            let old = std::mem::replace(&mut member.filter, filter);
            old.is_some() || member.filter.is_some()
        };
        if changed {
            self.report_filter_updated();
        }
    }
}

impl FilterObservable for ComposedFilter {
    fn observable_id(&self) -> ObservableId {
        self.id
    }

    fn observers(&self) -> &ObserverSet {
        &self.observers
    }

    fn current_filter(&self) -> Option<FilterRef> {
        self.as_filter()
    }
}
