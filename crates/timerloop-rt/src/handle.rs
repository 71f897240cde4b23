//! Reference-counted handle to a waiter.
//!
//! `Handle` owns a strong `Rc` into the waiter; the timer heap and poll
//! driver never hold one, only `WeakWaiter`s borrowed from it. Dropping
//! the last `Handle` while the waiter is still armed lets that `Weak`
//! dangle — upgrading it is the documented benign race, not a crash.

use std::ops::Deref;
use std::rc::Rc;

use crate::waiter::Waiter;

/// An owning, ref-counted pointer to a waiter.
///
/// Deref's to `Waiter`, so `handle.set_timeout(10)` reads exactly like
/// the waiter API — `Handle` itself only adds the explicit
/// add_ref/remove_ref/release/ref_count vocabulary of spec.md §4.4.
pub struct Handle(Waiter);

impl Handle {
    pub fn new(waiter: Waiter) -> Self {
        Handle(waiter)
    }

    /// Create another strong owner of the same waiter. Named to match
    /// the ref-counting vocabulary; equivalent to `Clone::clone`.
    pub fn add_ref(&self) -> Handle {
        Handle(self.0.clone())
    }

    /// Drop this handle's ownership. Equivalent to letting the `Handle`
    /// go out of scope; spelled out as its own method for symmetry with `add_ref`.
    pub fn release(self) {}

    /// Decrement this handle's ownership. Spec.md §4.4 names this
    /// alongside `add_ref`/`release` as the waiter's ref-count surface;
    /// here it is the same operation as `release` — consuming `self`
    /// drops the owned `Rc` either way, there being no separate "decrement
    /// without dropping" step in an `Rc`-backed handle.
    pub fn remove_ref(self) {}

    /// Number of strong owners remaining, including this one.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0 .0)
    }

    pub fn waiter(&self) -> &Waiter {
        &self.0
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        self.add_ref()
    }
}

impl Deref for Handle {
    type Target = Waiter;

    fn deref(&self) -> &Waiter {
        &self.0
    }
}
