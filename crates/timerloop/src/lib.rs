//! # timerloop
//!
//! The timer-and-poll core of a cooperative coroutine runtime: a
//! per-thread deadline heap, an epoll-backed readiness multiplexer, a
//! waiter state machine, and a drift-compensated repeater scheduler.
//!
//! This crate does not implement coroutines, channels, or a scheduler —
//! only the timing/readiness substrate such a runtime drives its leaf
//! coroutines with. Callers bring their own `Coroutine` implementation
//! (see [`Coroutine`]) and worker loop; `timerloop` tells that loop what
//! is due and when to wake up next.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use timerloop::{lifecycle, Coroutine, CoroutineRef, FinishReason, Waiter};
//!
//! struct PrintOnFire;
//!
//! impl Coroutine for PrintOnFire {
//!     fn start(&mut self) {}
//!     fn resume(&mut self) {}
//!     fn on_finish(&mut self, reason: FinishReason) -> Option<CoroutineRef> {
//!         println!("fired: {reason:?}");
//!         None
//!     }
//!     fn parent(&self) -> Option<CoroutineRef> {
//!         None
//!     }
//! }
//!
//! lifecycle::init().expect("timer core init");
//! let waiter = Waiter::new(Box::new(PrintOnFire));
//! waiter.set_timeout(100);
//! lifecycle::run_forever().expect("run_forever");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Worker Loop                          │
//! │            lifecycle::run_once() per iteration           │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!           ┌────────────────┼────────────────┐
//!           ▼                ▼                ▼
//!     ┌───────────┐   ┌─────────────┐   ┌────────────┐
//!     │   Clock   │   │ Timer Heap  │   │Poll Driver │
//!     │ (cached)  │   │ (BinaryHeap)│   │  (epoll)   │
//!     └───────────┘   └─────────────┘   └────────────┘
//!           │                │                │
//!           └────────────────┼────────────────┘
//!                            ▼
//!                   ┌─────────────────┐
//!                   │ Waiter / Handle │
//!                   │  state machine  │
//!                   └─────────────────┘
//!                            │
//!                            ▼
//!                   ┌─────────────────┐
//!                   │    Repeater     │
//!                   │  (periodic)     │
//!                   └─────────────────┘
//! ```

pub use timerloop_core::{
    env_get, env_get_bool, env_get_opt, CortError, CortResult, Coroutine, CoroutineRef,
    FinishReason, LogLevel,
};
pub use timerloop_core::{tdebug, terror, tinfo, ttrace, twarn};

pub use timerloop_rt::{lifecycle, Clock, Handle, PollDriver, Regime, Repeater, TimerHeap, Waiter};
pub use timerloop_rt::poll::{READABLE, WRITABLE};
