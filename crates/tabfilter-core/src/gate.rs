#![forbid(unsafe_code)]

//! Reentrant enable/disable gate with pending-notification latching.
//!
//! # Design
//!
//! The gate owns a signed balance and a pending flag. Callers bracket bulk
//! work with `set_enabled(false)` / `set_enabled(true)` pairs; while the
//! balance is negative, notifications are latched instead of fired. When an
//! enable call brings the balance back to exactly zero and something is
//! pending, a single notification fires.
//!
//! The fire operation returns whether the notification should remain
//! pending, which covers sinks that cannot accept it yet.
//!
//! # Invariants
//!
//! 1. `N` disables, any number of `notify(false)` calls, then `N` enables
//!    fire exactly once.
//! 2. A notification raised while the balance is negative is deferred, never
//!    dropped.
//! 3. No state borrow is held while firing, so the fire operation may call
//!    back into the gate. A notification latched by such a nested call stays
//!    pending after the outer fire returns.
//!
//! # Failure Modes
//!
//! - **Unbalanced disables**: the balance stays negative and notifications
//!   are deferred indefinitely. `set_enabled` returns `false` to signal it;
//!   [`NotificationGate::flush_pending`] still forces delivery.

use std::cell::Cell;
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Batches change notifications behind a reentrant counter.
pub struct NotificationGate {
    balance: Cell<i32>,
    pending: Cell<bool>,
    fire: Box<dyn Fn() -> bool>,
}

impl fmt::Debug for NotificationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationGate")
            .field("balance", &self.balance.get())
            .field("pending", &self.pending.get())
            .finish()
    }
}

impl NotificationGate {
    /// Create an open gate. `fire` delivers one notification and returns
    /// whether it should stay pending.
    pub fn new(fire: impl Fn() -> bool + 'static) -> Self {
        Self {
            balance: Cell::new(0),
            pending: Cell::new(false),
            fire: Box::new(fire),
        }
    }

    /// Increment (`true`) or decrement (`false`) the balance.
    ///
    /// Returns whether notifications currently flow (balance >= 0).
    pub fn set_enabled(&self, enable: bool) -> bool {
        let balance = self.balance.get() + if enable { 1 } else { -1 };
        self.balance.set(balance);
        if enable && balance == 0 && self.pending.get() {
            self.notify(false);
        }
        self.balance.get() >= 0
    }

    /// Fire the pending notification, if any, whatever the balance.
    pub fn flush_pending(&self) {
        if self.pending.get() {
            self.fire_now();
        }
    }

    /// Request a notification; `forced` latches it without firing.
    pub fn notify(&self, forced: bool) {
        if forced || self.balance.get() < 0 {
            self.pending.set(true);
            return;
        }
        self.fire_now();
    }

    #[must_use]
    pub fn balance(&self) -> i32 {
        self.balance.get()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    fn fire_now(&self) {
        #[cfg(feature = "tracing")]
        debug!(message = "gate.fire", balance = self.balance.get());
        // Cleared first: a notification latched by a nested call during the
        // fire must survive the fire's own result.
        self.pending.set(false);
        let still_pending = (self.fire)();
        self.pending.set(self.pending.get() || still_pending);
    }
}
