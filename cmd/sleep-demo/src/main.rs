//! Sleep demo
//!
//! Demonstrates arming a single waiter with a timeout and driving it
//! through the timer core's `run_forever` loop.

use std::time::Instant;

use timerloop::{lifecycle, tinfo, Coroutine, CoroutineRef, FinishReason, Waiter};

struct SleepPrinter {
    label: &'static str,
    started: Instant,
}

impl Coroutine for SleepPrinter {
    fn start(&mut self) {
        tinfo!("[{}] armed", self.label);
    }

    fn resume(&mut self) {}

    fn on_finish(&mut self, reason: FinishReason) -> Option<CoroutineRef> {
        println!(
            "[{}] finished after {:?}: {reason:?}",
            self.label,
            self.started.elapsed()
        );
        None
    }

    fn parent(&self) -> Option<CoroutineRef> {
        None
    }
}

fn main() {
    println!("=== timerloop sleep demo ===\n");

    lifecycle::init().expect("timer core init");

    let w1 = Waiter::new(Box::new(SleepPrinter {
        label: "sleeper-50ms",
        started: Instant::now(),
    }));
    w1.set_timeout(50);

    let w2 = Waiter::new(Box::new(SleepPrinter {
        label: "sleeper-120ms",
        started: Instant::now(),
    }));
    w2.set_timeout(120);

    println!("Waiting for {} and {} to fire...\n", "sleeper-50ms", "sleeper-120ms");
    lifecycle::run_forever().expect("run_forever");

    println!(
        "\nDone. cost(50ms) = {}ms, cost(120ms) = {}ms",
        w1.get_time_cost(),
        w2.get_time_cost()
    );

    lifecycle::destroy();
    println!("=== Example Complete ===");
}
