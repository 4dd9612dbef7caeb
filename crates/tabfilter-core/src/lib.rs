#![forbid(unsafe_code)]

//! Core: row predicates, observable filter composition, and notification gating.
//!
//! - [`RowFilter`] / [`Entry`]: the predicate contract evaluated once per row.
//! - [`ObserverSet`], [`FilterObservable`], [`FilterObserver`]: the
//!   publish/subscribe channel between filters.
//! - [`ComposedFilter`]: AND / OR / NOT over a dynamic set of observed filters.
//! - [`UserFilter`]: an atomic leaf whose predicate is set by application code.
//! - [`NotificationGate`]: reentrant batching of downstream notifications.
//!
//! Everything here is single-threaded (`Rc` / `RefCell`), and every call runs
//! synchronously on the caller's stack.

pub mod composed;
pub mod entry;
pub mod gate;
pub mod observer;
pub mod user_filter;
pub mod value;

pub use composed::{Combinator, ComposedFilter};
pub use entry::{Entry, FilterRef, RowFilter, filter_fn};
pub use gate::NotificationGate;
pub use observer::{
    FilterObservable, FilterObserver, ObservableId, ObserverSet, SharedObservable, SubscriptionId,
};
pub use user_filter::UserFilter;
pub use value::CellValue;
