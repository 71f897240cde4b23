//! Echo-timeout demo
//!
//! Arms a single waiter with both a long timeout and interest in a
//! self-pipe becoming readable. A background OS thread writes to the
//! pipe shortly after the waiter is armed, demonstrating that readiness
//! preempts the pending deadline.

use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use nix::unistd::write;

use timerloop::{lifecycle, tinfo, Coroutine, CoroutineRef, FinishReason, Waiter};

struct EchoWaiter {
    started: Instant,
}

impl Coroutine for EchoWaiter {
    fn start(&mut self) {
        tinfo!("echo-timeout: armed, waiting on pipe readability or 5s timeout");
    }

    fn resume(&mut self) {}

    fn on_finish(&mut self, reason: FinishReason) -> Option<CoroutineRef> {
        println!(
            "echo-timeout: finished after {:?}: {reason:?}",
            self.started.elapsed()
        );
        None
    }

    fn parent(&self) -> Option<CoroutineRef> {
        None
    }
}

fn main() {
    println!("=== timerloop echo-timeout demo ===\n");

    lifecycle::init().expect("timer core init");

    let (r, w) = nix::unistd::pipe().expect("pipe");
    let r_fd = r.as_raw_fd();

    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        write(&w, b"x").expect("write to self-pipe");
    });

    let waiter = Waiter::new(Box::new(EchoWaiter {
        started: Instant::now(),
    }));
    waiter.set_timeout(5_000);
    waiter
        .set_poll_request(r_fd, timerloop::READABLE)
        .expect("register pipe fd");

    lifecycle::run_forever().expect("run_forever");
    writer.join().expect("writer thread");

    println!(
        "\nresult: poll_result={:#04x}, is_timeout={}, get_time_cost={}ms",
        waiter.poll_result(),
        waiter.is_timeout(),
        waiter.get_time_cost(),
    );

    waiter.remove_cort_fd();
    drop(r);
    lifecycle::destroy();
    println!("=== Example Complete ===");
}
