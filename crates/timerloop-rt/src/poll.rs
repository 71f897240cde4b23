//! Poll driver: epoll-backed readiness multiplexing.
//!
//! One `PollDriver` per thread, owned by the `TimerCore` alongside the
//! clock and timer heap. Registrations key on the raw fd; the `u64` epoll
//! `data` word carries a pointer-sized token that round-trips to the
//! owning waiter's `WeakWaiter` via a side table (storing the `Weak`
//! itself in the `data` word is not possible since it isn't `Copy`).

use std::collections::HashMap;
use std::os::fd::{AsFd, BorrowedFd, RawFd};
use std::time::Duration;

use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};

use timerloop_core::{CortError, CortResult};

use crate::config::PollDriverConfig;
use crate::waiter::WeakWaiter;

/// Readiness bits the caller may request, deliberately a subset of
/// `EpollFlags` expressed as plain `u32` so `timerloop-core`'s
/// `Coroutine` boundary and waiter API stay free of the `nix` type.
pub const READABLE: u32 = 0b01;
pub const WRITABLE: u32 = 0b10;

fn to_epoll_flags(bits: u32) -> EpollFlags {
    let mut flags = EpollFlags::empty();
    if bits & READABLE != 0 {
        flags |= EpollFlags::EPOLLIN;
    }
    if bits & WRITABLE != 0 {
        flags |= EpollFlags::EPOLLOUT;
    }
    flags
}

fn from_epoll_flags(flags: EpollFlags) -> u32 {
    let mut bits = 0;
    if flags.contains(EpollFlags::EPOLLIN) {
        bits |= READABLE;
    }
    if flags.contains(EpollFlags::EPOLLOUT) {
        bits |= WRITABLE;
    }
    bits
}

/// Per-thread epoll instance plus the fd → waiter side table.
pub struct PollDriver {
    epoll: Epoll,
    waiters: HashMap<RawFd, WeakWaiter>,
    max_events: usize,
}

impl PollDriver {
    pub fn new() -> CortResult<Self> {
        Self::with_config(PollDriverConfig::from_env())
    }

    pub fn with_config(config: PollDriverConfig) -> CortResult<Self> {
        let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC)
            .map_err(|e| CortError::InitFailed(format!("epoll_create1: {e}")))?;
        Ok(Self {
            epoll,
            waiters: HashMap::new(),
            max_events: config.max_events.max(1),
        })
    }

    /// The underlying epoll fd, for embedding this thread's driver into a
    /// wider multiplexer (an escape hatch for embedding).
    pub fn as_raw_fd(&self) -> RawFd {
        use std::os::fd::AsRawFd;
        self.epoll.as_fd().as_raw_fd()
    }

    /// Register `fd` for `events`, routing its readiness to `waiter`. On
    /// failure the fd is left out of the side table entirely — the
    /// waiter's `poll_request` stays whatever the caller already set, but
    /// it is not actually armed in the multiplexer, preserving "armed(w)
    /// iff w is in the side table".
    pub fn register(&mut self, fd: RawFd, events: u32, waiter: WeakWaiter) -> CortResult<()> {
        let ev = EpollEvent::new(to_epoll_flags(events), fd as u64);
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        self.epoll.add(borrowed, ev).map_err(|e| {
            terror_registration(fd, &e);
            CortError::RegistrationFailed(e as i32)
        })?;
        self.waiters.insert(fd, waiter);
        Ok(())
    }

    pub fn modify(&mut self, fd: RawFd, events: u32, waiter: WeakWaiter) -> CortResult<()> {
        let ev = EpollEvent::new(to_epoll_flags(events), fd as u64);
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        self.epoll.modify(borrowed, &ev).map_err(|e| {
            terror_registration(fd, &e);
            CortError::RegistrationFailed(e as i32)
        })?;
        self.waiters.insert(fd, waiter);
        Ok(())
    }

    pub fn unregister(&mut self, fd: RawFd) {
        if self.waiters.remove(&fd).is_some() {
            let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
            // ENOENT/EBADF here mean the fd is already gone (closed by the
            // caller, or never survived a prior error) — the benign-race
            // reading for stale weak references.
            let _ = self.epoll.delete(borrowed);
        }
    }

    /// True iff `fd` is actually armed in the multiplexer right now. The
    /// authoritative source for the register-vs-modify decision — a
    /// waiter's own `fd` field can be stale after a failed registration,
    /// but this table only ever reflects what `epoll_ctl` actually
    /// accepted.
    pub fn contains(&self, fd: RawFd) -> bool {
        self.waiters.contains_key(&fd)
    }

    /// Every waiter currently armed in the multiplexer, for teardown.
    pub fn drain_waiters(&mut self) -> Vec<WeakWaiter> {
        self.waiters.drain().map(|(_, w)| w).collect()
    }

    /// Block for at most `timeout` (None = forever, Some(0) = immediate
    /// poll), returning the waiters whose registered fd became ready,
    /// paired with the readiness bits observed.
    pub fn wait(&mut self, timeout: Option<Duration>) -> CortResult<Vec<(WeakWaiter, u32)>> {
        let mut events = vec![EpollEvent::empty(); self.max_events];
        let epoll_timeout = match timeout {
            None => EpollTimeout::NONE,
            // `EpollTimeout::from` only accepts a u16 (0-65535ms); clamp
            // to that range rather than the wider `i32` range accepted by
            // epoll_wait itself, or a large deadline would silently wrap
            // when narrowed. A clamped wait just returns empty sooner and
            // the driver recomputes the budget on the next run_once.
            Some(d) => EpollTimeout::from(d.as_millis().min(u16::MAX as u128) as u16),
        };
        let n = self
            .epoll
            .wait(&mut events, epoll_timeout)
            .map_err(|e| CortError::InitFailed(format!("epoll_wait: {e}")))?;

        let mut ready = Vec::with_capacity(n);
        for ev in &events[..n] {
            let fd = ev.data() as RawFd;
            if let Some(waiter) = self.waiters.get(&fd) {
                ready.push((waiter.clone(), from_epoll_flags(ev.events())));
            }
        }
        Ok(ready)
    }

    pub fn registered_count(&self) -> usize {
        self.waiters.len()
    }
}

fn terror_registration(fd: RawFd, e: &nix::Error) {
    timerloop_core::terror!("epoll_ctl failed for fd {fd}: {e}");
}
