//! The waiter state machine.
//!
//! A `Waiter` is a suspended leaf coroutine awaiting a deadline and/or fd
//! readiness. It lives behind `Rc<RefCell<WaiterInner>>`; the timer heap
//! and poll driver hold non-owning `Weak` references to it (`WeakWaiter`),
//! while a `Handle` (see `handle.rs`) holds the strong owning `Rc`.

use std::cell::{Cell, RefCell};
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};

use timerloop_core::{Coroutine, FinishReason};

use crate::core::with_core;

/// Non-owning reference to a waiter, as stored by the timer heap and poll
/// driver. Upgrading a dangling `WeakWaiter` (its last `Handle` dropped
/// while still armed) is a documented caller defect — the
/// heap/driver treat that as "already gone" and silently drop the stale
/// bucket/registration entry (a benign race, not an error).
pub type WeakWaiter = Weak<RefCell<WaiterInner>>;

const TIMEOUT_BIT: u32 = 1 << 31;
const STOPPED_BIT: u32 = 1 << 30;
const ELAPSED_MASK: u32 = (1 << 30) - 1;
const ELAPSED_MAX: u64 = ELAPSED_MASK as u64;

/// The waiter's private state.
pub struct WaiterInner {
    start_ms: Cell<u64>,
    elapsed_and_flags: Cell<u32>,
    /// Deadline this waiter is currently filed under, if armed. The
    /// bucket-cursor token standing in for an opaque
    /// back-pointer into the heap.
    heap_link: Cell<Option<u64>>,
    fd: Cell<RawFd>,
    poll_request: Cell<u32>,
    poll_result: Cell<u32>,
    coroutine: RefCell<Box<dyn Coroutine>>,
}

/// A suspended leaf coroutine awaiting a timeout and/or fd readiness.
///
/// Cloning a `Waiter` clones the underlying `Rc` — this is exactly
/// `add_ref` (see `Handle`, which wraps this same `Rc` and gives the
/// operation its documented name).
#[derive(Clone)]
pub struct Waiter(pub(crate) Rc<RefCell<WaiterInner>>);

impl Waiter {
    /// Create a new, detached waiter for the given leaf coroutine. No
    /// deadline, no fd registration.
    pub fn new(coroutine: Box<dyn Coroutine>) -> Self {
        Waiter(Rc::new(RefCell::new(WaiterInner {
            start_ms: Cell::new(with_core(|c| c.clock.now_ms())),
            elapsed_and_flags: Cell::new(0),
            heap_link: Cell::new(None),
            fd: Cell::new(-1),
            poll_request: Cell::new(0),
            poll_result: Cell::new(0),
            coroutine: RefCell::new(coroutine),
        })))
    }

    /// A non-owning reference to this waiter, as the timer heap and poll
    /// driver store internally. Exposed publicly so benchmarks and
    /// alternative drivers can exercise the heap/poll APIs directly.
    pub fn downgrade(&self) -> WeakWaiter {
        Rc::downgrade(&self.0)
    }

    fn inner(&self) -> std::cell::Ref<'_, WaiterInner> {
        self.0.borrow()
    }

    /// Set (or re-arm) the timeout to fire `ms` milliseconds from now.
    ///
    /// `ms == 0` is not special-cased: it simply arms a deadline equal to
    /// the current clock reading, which fires on the very next poll. A
    /// caller wanting "no timeout" calls `clear_timeout` instead.
    pub fn set_timeout(&self, ms: u64) {
        self.clear_timeout();
        let now = with_core(|c| c.clock.now_ms());
        let deadline = now + ms;
        self.0.borrow().start_ms.set(now);
        with_core(|c| c.heap.add(self.downgrade(), deadline));
        self.0.borrow().heap_link.set(Some(deadline));
    }

    /// Remove this waiter from the heap, if armed. Idempotent.
    pub fn clear_timeout(&self) {
        if let Some(deadline) = self.0.borrow().heap_link.take() {
            with_core(|c| c.heap.remove(&self.downgrade(), deadline));
        }
    }

    /// Register (or update) interest in readiness events on `fd`.
    /// Passing `events == 0` unregisters.
    ///
    /// Returns `Err` if the OS multiplexer rejects the registration
    /// (`epoll_ctl` add/mod failing). On failure `fd`/`poll_request` are
    /// left as if the call had never happened (`poll_request` reset to 0)
    /// — the waiter remains unarmed for fd, and a later retry on the same
    /// fd correctly re-takes the add path rather than being stuck
    /// retrying a `modify` against an fd the multiplexer never armed.
    pub fn set_poll_request(&self, fd: RawFd, events: u32) -> timerloop_core::CortResult<()> {
        let prior_fd = self.0.borrow().fd.get();
        if prior_fd >= 0 && prior_fd != fd {
            with_core(|c| c.poll.unregister(prior_fd));
        }
        if events == 0 {
            with_core(|c| c.poll.unregister(fd));
            self.0.borrow().fd.set(fd);
            self.0.borrow().poll_request.set(0);
            return Ok(());
        }
        // The multiplexer's own registration table is the source of truth
        // for add-vs-modify, not the waiter's previously recorded `fd` —
        // a prior failed `register` call never made it into that table.
        let already_armed = with_core(|c| c.poll.contains(fd));
        let result = if already_armed {
            with_core(|c| c.poll.modify(fd, events, self.downgrade()))
        } else {
            with_core(|c| c.poll.register(fd, events, self.downgrade()))
        };
        match result {
            Ok(()) => {
                self.0.borrow().fd.set(fd);
                self.0.borrow().poll_request.set(events);
                Ok(())
            }
            Err(e) => {
                self.0.borrow().fd.set(fd);
                self.0.borrow().poll_request.set(0);
                Err(e)
            }
        }
    }

    /// Unregister the fd from the poll driver without closing it.
    pub fn remove_poll_request(&self) {
        let fd = self.0.borrow().fd.get();
        if fd >= 0 {
            with_core(|c| c.poll.unregister(fd));
            self.0.borrow().poll_request.set(0);
        }
    }

    /// Unregister and close the watched fd.
    pub fn close_cort_fd(&self) {
        let fd = self.0.borrow().fd.get();
        if fd >= 0 {
            with_core(|c| c.poll.unregister(fd));
            unsafe { libc::close(fd) };
            self.0.borrow().fd.set(-1);
            self.0.borrow().poll_request.set(0);
        }
    }

    /// Unregister the watched fd and clear the field, without closing it.
    pub fn remove_cort_fd(&self) {
        self.remove_poll_request();
        self.0.borrow().fd.set(-1);
    }

    /// Elapsed milliseconds at the last finish (low 30 bits), clamped to
    /// `2^30 - 1`.
    pub fn get_time_cost(&self) -> u32 {
        self.inner().elapsed_and_flags.get() & ELAPSED_MASK
    }

    /// Elapsed milliseconds since arming, queried live (not only valid
    /// after finish).
    pub fn get_time_past(&self) -> u32 {
        let now = with_core(|c| c.clock.now_ms());
        now.saturating_sub(self.inner().start_ms.get()).min(ELAPSED_MAX) as u32
    }

    /// The absolute deadline this waiter is armed for, if any.
    pub fn get_timeout_time(&self) -> Option<u64> {
        self.inner().heap_link.get()
    }

    pub fn is_timeout(&self) -> bool {
        self.inner().elapsed_and_flags.get() & TIMEOUT_BIT != 0
    }

    pub fn is_stopped(&self) -> bool {
        self.inner().elapsed_and_flags.get() & STOPPED_BIT != 0
    }

    pub fn is_timeout_or_stopped(&self) -> bool {
        self.inner().elapsed_and_flags.get() & (TIMEOUT_BIT | STOPPED_BIT) != 0
    }

    pub fn is_set_timeout(&self) -> bool {
        self.inner().heap_link.get().is_some()
    }

    /// Raw readiness bits the driver last reported (0 if none).
    pub fn poll_result(&self) -> u32 {
        self.inner().poll_result.get()
    }

    pub fn fd(&self) -> RawFd {
        self.inner().fd.get()
    }

    // ---- Invoked only by the poll driver (crate-internal) ----

    pub(crate) fn set_poll_result(&self, bits: u32) {
        self.0.borrow().poll_result.set(bits);
    }

    /// Compute elapsed time, pack the finish flag, detach from heap/poll,
    /// and invoke the coroutine's `on_finish` hook. Returns a successor
    /// coroutine to resume in this waiter's place, if any.
    pub(crate) fn finish(&self, reason: FinishReason) -> Option<timerloop_core::CoroutineRef> {
        let now = with_core(|c| c.clock.now_ms());
        let inner = self.0.borrow();
        let elapsed = now.saturating_sub(inner.start_ms.get()).min(ELAPSED_MAX) as u32;
        let flag = match reason {
            FinishReason::Timeout => TIMEOUT_BIT,
            FinishReason::Stopped => STOPPED_BIT,
            FinishReason::Ready => 0,
        };
        inner.elapsed_and_flags.set(elapsed | flag);
        drop(inner);

        self.clear_timeout();
        self.remove_poll_request();

        self.0.borrow().coroutine.borrow_mut().on_finish(reason)
    }

    pub(crate) fn resume(&self) {
        self.0.borrow().coroutine.borrow_mut().resume();
    }

    pub(crate) fn start(&self) {
        self.0.borrow().coroutine.borrow_mut().start();
    }
}
