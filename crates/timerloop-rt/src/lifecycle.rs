//! Thread lifecycle API: the public surface a worker loop
//! calls once per iteration to drive the clock, timer heap, and poll
//! driver forward.

use std::rc::Rc;
use std::time::Duration;

use timerloop_core::{tdebug, CortResult, FinishReason};

use crate::core::{timer_destroy, timer_init, with_core};
use crate::waiter::Waiter;

/// Initialize this thread's timer core. Safe to call more than once.
pub fn init() -> CortResult<()> {
    timer_init()
}

/// Tear down this thread's timer core: finishes every still-armed waiter
/// with `FinishReason::Stopped`, then drops the heap and poll driver.
///
/// "Armed" per the glossary means filed in the heap *or* registered with
/// the poll driver — a waiter can be armed purely by an fd registration
/// (timeout cleared, `poll_request != 0`) and must be stopped too, not
/// just the ones still sitting in the heap.
pub fn destroy() {
    let stragglers = with_core(|core| {
        let mut all = core.heap.drain_expired(u64::MAX);
        all.extend(core.poll.drain_waiters());
        all
    });
    let mut seen = std::collections::HashSet::new();
    for w in stragglers {
        if let Some(rc) = w.upgrade() {
            // The same waiter can be armed in both the heap and the poll
            // driver at once; drained from both above, it must only be
            // finished once.
            if seen.insert(Rc::as_ptr(&rc) as *const ()) {
                Waiter(rc).finish(FinishReason::Stopped);
            }
        }
    }
    timer_destroy();
}

/// Re-read the OS clock. Call once per loop iteration, right after
/// waking from `run_once`/`run_forever`.
pub fn refresh_clock() -> u64 {
    with_core(|core| core.clock.refresh())
}

/// The cached clock value (no syscall).
pub fn now_ms() -> u64 {
    with_core(|core| core.clock.now_ms())
}

/// This thread's poll driver fd, for embedding into an outer
/// multiplexer.
pub fn poll_fd() -> std::os::fd::RawFd {
    with_core(|core| core.poll.as_raw_fd())
}

/// Number of fds currently registered with the poll driver.
pub fn waited_fd_count() -> usize {
    with_core(|core| core.poll.registered_count())
}

/// Run one iteration: block until the next timer deadline or fd
/// readiness event (whichever comes first), then finish every waiter
/// that is now due. Returns the number of waiters finished.
pub fn run_once() -> CortResult<usize> {
    let now = refresh_clock();
    let budget = with_core(|core| core.heap.peek_deadline())
        .map(|deadline| Duration::from_millis(deadline.saturating_sub(now)));

    let ready = with_core(|core| core.poll.wait(budget))?;
    let now = refresh_clock();

    let mut finished = 0;
    for (weak, bits) in ready {
        if let Some(rc) = weak.upgrade() {
            let waiter = Waiter(rc);
            waiter.set_poll_result(bits);
            // `finish` clears any still-armed timeout itself, so readiness
            // here correctly preempts a pending deadline rather than
            // leaving a stale heap entry to double-finish this waiter
            // later.
            let successor = waiter.finish(FinishReason::Ready);
            resume_successor(successor);
            finished += 1;
        }
    }

    let expired = with_core(|core| core.heap.drain_expired(now));
    for weak in expired {
        if let Some(rc) = weak.upgrade() {
            let successor = Waiter(rc).finish(FinishReason::Timeout);
            resume_successor(successor);
            finished += 1;
        }
    }

    tdebug!("run_once: finished {finished} waiter(s)");
    Ok(finished)
}

/// When a finished waiter's `on_finish` hands back a successor
/// coroutine (its parent, resuming now that the child is done), step
/// into it immediately rather than waiting for the next loop iteration.
fn resume_successor(successor: Option<timerloop_core::CoroutineRef>) {
    if let Some(parent) = successor {
        parent.borrow_mut().resume();
    }
}

/// Run `run_once` until the heap is empty and no fds are registered.
/// Intended for small demo binaries; real worker loops call `run_once`
/// directly alongside their own ready-queue draining.
pub fn run_forever() -> CortResult<()> {
    loop {
        let armed = with_core(|core| !core.heap.is_empty() || core.poll.registered_count() > 0);
        if !armed {
            return Ok(());
        }
        run_once()?;
    }
}

/// Suspend the calling OS thread (not a coroutine) for `d`. Convenience
/// sugar for demos and tests; production code should arm a waiter and
/// let `run_once`/`run_forever` drive it instead of blocking the whole
/// thread.
pub fn sleep(d: Duration) {
    std::thread::sleep(d);
}

pub fn sleep_ms(ms: u64) {
    sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubCoroutine;
    use crate::waiter::Waiter;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_run_once_fires_expired_timeout() {
        crate::core::test_scope(|| {
            let w = Waiter::new(Box::new(StubCoroutine::default()));
            w.set_timeout(0);
            std::thread::sleep(Duration::from_millis(5));
            let finished = run_once().unwrap();
            assert_eq!(finished, 1);
            assert!(w.is_timeout());
        });
    }

    #[test]
    fn test_run_forever_returns_when_idle() {
        crate::core::test_scope(|| {
            run_forever().unwrap();
        });
    }

    #[test]
    fn test_destroy_finishes_stragglers_as_stopped() {
        crate::core::test_scope(|| {
            let stub = Rc::new(RefCell::new(StubCoroutine::default()));
            struct Wrapper(Rc<RefCell<StubCoroutine>>);
            impl timerloop_core::Coroutine for Wrapper {
                fn start(&mut self) {
                    self.0.borrow_mut().start();
                }
                fn resume(&mut self) {
                    self.0.borrow_mut().resume();
                }
                fn on_finish(
                    &mut self,
                    reason: timerloop_core::FinishReason,
                ) -> Option<timerloop_core::CoroutineRef> {
                    self.0.borrow_mut().on_finish(reason)
                }
                fn parent(&self) -> Option<timerloop_core::CoroutineRef> {
                    None
                }
            }
            let w = Waiter::new(Box::new(Wrapper(stub.clone())));
            w.set_timeout(60_000);
            destroy();
            assert_eq!(stub.borrow().finished_as, Some(FinishReason::Stopped));
        });
    }

    #[test]
    fn test_destroy_finishes_fd_only_armed_waiter_as_stopped() {
        crate::core::test_scope(|| {
            // A waiter can be armed purely by an fd registration (no
            // deadline) — `clear_timeout` was called, or `set_timeout`
            // simply never was. It must still be stopped on teardown.
            let (r, w_pipe) = nix::unistd::pipe().expect("pipe");
            let r_fd = std::os::fd::AsRawFd::as_raw_fd(&r);

            let w = Waiter::new(Box::new(StubCoroutine::default()));
            w.set_poll_request(r_fd, crate::poll::READABLE).expect("register");
            assert!(!w.is_set_timeout());
            assert_eq!(waited_fd_count(), 1);

            destroy();

            assert!(w.is_stopped());
            assert!(!w.is_timeout());
            drop(r);
            drop(w_pipe);
        });
    }
}
