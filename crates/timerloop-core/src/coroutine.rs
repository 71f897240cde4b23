//! The `Coroutine` collaborator contract.
//!
//! The timer-and-poll core does not implement coroutine suspend/resume —
//! that lives in a separate, unwritten framework. This trait is the seam:
//! the core invokes these four operations at defined points and otherwise
//! knows nothing about how a coroutine body runs.

use std::cell::RefCell;
use std::rc::Rc;

/// Why a waiter finished. Passed to `Coroutine::on_finish` so the
/// collaborator doesn't have to re-derive it from waiter flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The armed deadline passed before any fd became ready.
    Timeout,
    /// The registered fd reported readiness.
    Ready,
    /// The owning thread's core is tearing down.
    Stopped,
}

/// A shared handle to a coroutine, used for the one-directional
/// parent→child resumption link.
pub type CoroutineRef = Rc<RefCell<dyn Coroutine>>;

/// Capability a leaf coroutine must provide to be driven by the core.
///
/// A leaf coroutine yields at most once and is resumed by exactly one of
/// {timeout, readiness, stop}; it must not itself await another
/// coroutine.
pub trait Coroutine {
    /// Enter the coroutine body for the first time.
    fn start(&mut self);

    /// Re-enter the coroutine body at its suspension point.
    fn resume(&mut self);

    /// Called when the waiter driving this coroutine finishes. May return
    /// a successor coroutine to resume in its place, or `None`.
    fn on_finish(&mut self, reason: FinishReason) -> Option<CoroutineRef>;

    /// The coroutine awaiting this one, if any.
    fn parent(&self) -> Option<CoroutineRef>;
}
