//! Timer heap: deadline aggregation and expiry draining.
//!
//! Deadlines are deduplicated — many waiters sharing a millisecond tick
//! collapse onto one `BinaryHeap` entry — which keeps the heap small under
//! the "thundering herd of identical timeouts" workload the aggregation
//! rationale the aggregation is built for. Within a shared deadline, waiters
//! fire in FIFO (insertion) order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use crate::waiter::WeakWaiter;

struct Bucket {
    waiters: VecDeque<WeakWaiter>,
}

/// Per-thread min-heap of timer deadlines.
#[derive(Default)]
pub struct TimerHeap {
    order: BinaryHeap<Reverse<u64>>,
    buckets: HashMap<u64, Bucket>,
}

impl TimerHeap {
    pub fn new() -> Self {
        Self {
            order: BinaryHeap::new(),
            buckets: HashMap::new(),
        }
    }

    /// File `waiter` under `deadline_ms`, creating a new bucket (and a
    /// fresh `BinaryHeap` entry) only if no waiter is already filed there.
    pub fn add(&mut self, waiter: WeakWaiter, deadline_ms: u64) {
        match self.buckets.get_mut(&deadline_ms) {
            Some(bucket) => bucket.waiters.push_back(waiter),
            None => {
                let mut waiters = VecDeque::with_capacity(1);
                waiters.push_back(waiter);
                self.buckets.insert(deadline_ms, Bucket { waiters });
                self.order.push(Reverse(deadline_ms));
            }
        }
    }

    /// Remove a specific waiter from the bucket at `deadline_ms`. The
    /// stale `BinaryHeap` entry (if the bucket becomes empty) is left in
    /// place for lazy deletion in `drain_expired`/`peek_deadline`.
    pub fn remove(&mut self, waiter: &WeakWaiter, deadline_ms: u64) {
        if let Some(bucket) = self.buckets.get_mut(&deadline_ms) {
            bucket.waiters.retain(|w| !w.ptr_eq(waiter));
            if bucket.waiters.is_empty() {
                self.buckets.remove(&deadline_ms);
            }
        }
    }

    /// The next live deadline, skipping stale heap entries whose bucket
    /// is already gone. Used by the repeater/poll driver to compute how
    /// long to block.
    pub fn peek_deadline(&mut self) -> Option<u64> {
        self.discard_stale();
        self.order.peek().map(|Reverse(d)| *d)
    }

    /// Remove and return every waiter whose deadline has elapsed (`<=
    /// now_ms`), most-overdue bucket first, FIFO within a bucket. Does
    /// not itself mark the waiters finished — the caller (poll driver)
    /// does that.
    pub fn drain_expired(&mut self, now_ms: u64) -> Vec<WeakWaiter> {
        let mut out = Vec::new();
        loop {
            self.discard_stale();
            let Some(Reverse(deadline)) = self.order.peek().copied() else {
                break;
            };
            if deadline > now_ms {
                break;
            }
            self.order.pop();
            if let Some(bucket) = self.buckets.remove(&deadline) {
                out.extend(bucket.waiters);
            }
        }
        out
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse(deadline)) = self.order.peek().copied() {
            if self.buckets.contains_key(&deadline) {
                break;
            }
            self.order.pop();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.waiters.len()).sum()
    }
}
