//! End-to-end integration tests for the timer-and-poll core: a single
//! sleep, deadline aggregation, teardown, and readiness preempting a
//! timeout. Each exercises the real thread-local timer core end to end,
//! driven through `lifecycle::run_once`.
//!
//! Repeater drift-correction and stall-skip behavior is covered instead
//! as deterministic unit tests alongside `Repeater`'s implementation,
//! since they depend on injected clock gaps rather than real readiness
//! events.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use timerloop_core::{Coroutine, CoroutineRef, FinishReason};
use timerloop_rt::lifecycle;
use timerloop_rt::waiter::Waiter;

/// The only `Coroutine` implementation in this crate's tests: a stub
/// that just records how it finished.
#[derive(Default)]
struct RecordingCoroutine {
    finished_as: Option<FinishReason>,
    finished_at: Option<Instant>,
}

struct Recorder(Rc<RefCell<RecordingCoroutine>>);

impl Coroutine for Recorder {
    fn start(&mut self) {}
    fn resume(&mut self) {}
    fn on_finish(&mut self, reason: FinishReason) -> Option<CoroutineRef> {
        let mut inner = self.0.borrow_mut();
        inner.finished_as = Some(reason);
        inner.finished_at = Some(Instant::now());
        None
    }
    fn parent(&self) -> Option<CoroutineRef> {
        None
    }
}

fn recorder() -> (Waiter, Rc<RefCell<RecordingCoroutine>>) {
    let state = Rc::new(RefCell::new(RecordingCoroutine::default()));
    let waiter = Waiter::new(Box::new(Recorder(state.clone())));
    (waiter, state)
}

fn run_until_idle(max_iters: usize) {
    for _ in 0..max_iters {
        lifecycle::run_once().unwrap();
        if lifecycle::waited_fd_count() == 0 {
            break;
        }
    }
}

#[test]
fn single_sleep_fires_timeout() {
    lifecycle::init().unwrap();
    let (w, state) = recorder();
    w.set_timeout(50);

    let started = Instant::now();
    lifecycle::run_forever().unwrap();
    let elapsed = started.elapsed();

    assert!(w.is_timeout());
    assert!(elapsed >= Duration::from_millis(45));
    let cost = w.get_time_cost();
    assert!((45..=200).contains(&cost), "get_time_cost() = {cost}");
    assert_eq!(state.borrow().finished_as, Some(FinishReason::Timeout));
    lifecycle::destroy();
}

#[test]
fn waiters_sharing_a_deadline_resume_in_fifo_order() {
    lifecycle::init().unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    let mut waiters = Vec::with_capacity(1000);
    struct OrderRecorder {
        order: Rc<RefCell<Vec<usize>>>,
        index: usize,
    }
    impl Coroutine for OrderRecorder {
        fn start(&mut self) {}
        fn resume(&mut self) {}
        fn on_finish(&mut self, _reason: FinishReason) -> Option<CoroutineRef> {
            self.order.borrow_mut().push(self.index);
            None
        }
        fn parent(&self) -> Option<CoroutineRef> {
            None
        }
    }

    for i in 0..1000 {
        let w = Waiter::new(Box::new(OrderRecorder {
            order: order.clone(),
            index: i,
        }));
        w.set_timeout(20);
        waiters.push(w);
    }

    let started = Instant::now();
    lifecycle::run_forever().unwrap();
    let elapsed = started.elapsed();

    assert_eq!(order.borrow().len(), 1000);
    assert!(
        order.borrow().windows(2).all(|pair| pair[0] < pair[1]),
        "waiters sharing a deadline must resume in FIFO order"
    );
    assert!(
        elapsed <= Duration::from_millis(100),
        "1000 waiters sharing one deadline should resume within ~5ms of each other, took {elapsed:?}"
    );
}

#[test]
fn destroy_stops_every_armed_waiter() {
    lifecycle::init().unwrap();
    let (w1, s1) = recorder();
    let (w2, s2) = recorder();
    let (w3, s3) = recorder();
    w1.set_timeout(100);
    w2.set_timeout(200);
    w3.set_timeout(300);

    std::thread::sleep(Duration::from_millis(10));
    lifecycle::destroy();

    assert!(w1.is_stopped() && !w1.is_timeout());
    assert!(w2.is_stopped() && !w2.is_timeout());
    assert!(w3.is_stopped() && !w3.is_timeout());
    assert_eq!(s1.borrow().finished_as, Some(FinishReason::Stopped));
    assert_eq!(s2.borrow().finished_as, Some(FinishReason::Stopped));
    assert_eq!(s3.borrow().finished_as, Some(FinishReason::Stopped));
}

#[test]
fn readiness_preempts_pending_timeout() {
    lifecycle::init().unwrap();
    let (r, w) = nix::unistd::pipe().unwrap();
    let r_fd = std::os::fd::AsRawFd::as_raw_fd(&r);

    let (waiter, state) = recorder();
    waiter.set_timeout(1000);
    waiter
        .set_poll_request(r_fd, timerloop_rt::poll::READABLE)
        .expect("register pipe fd");

    std::thread::sleep(Duration::from_millis(10));
    nix::unistd::write(&w, b"x").unwrap();

    let started = Instant::now();
    run_until_idle(16);
    let _ = started.elapsed();

    assert_ne!(waiter.poll_result(), 0);
    assert!(!waiter.is_timeout());
    assert_eq!(state.borrow().finished_as, Some(FinishReason::Ready));
    let cost = waiter.get_time_cost();
    assert!(cost < 200, "get_time_cost() = {cost}, expected ~10ms");

    drop(r);
    drop(w);
    lifecycle::destroy();
}
