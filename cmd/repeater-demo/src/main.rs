//! Repeater demo
//!
//! Drives a 10-calls/sec `Repeater` through a handful of ticks using
//! `run_once` directly, then stops it.

use std::cell::RefCell;
use std::rc::Rc;

use timerloop::{lifecycle, Repeater};

fn main() {
    println!("=== timerloop repeater demo ===\n");

    lifecycle::init().expect("timer core init");

    let ticks = Rc::new(RefCell::new(Vec::new()));
    let ticks_clone = ticks.clone();
    let repeater = Repeater::new_rate(10, move |tick| {
        ticks_clone.borrow_mut().push(tick);
        println!("tick {tick}");
    });

    println!("regime: {:?}\n", repeater.regime());

    const WANTED_TICKS: usize = 8;
    while ticks.borrow().len() < WANTED_TICKS {
        lifecycle::run_once().expect("run_once");
    }

    repeater.stop();
    println!(
        "\nstopped after {} tick(s), stall_count={}",
        ticks.borrow().len(),
        repeater.stall_count()
    );

    lifecycle::destroy();
    println!("=== Example Complete ===");
}
