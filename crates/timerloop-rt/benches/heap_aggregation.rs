//! Benchmarks the timer heap's deadline aggregation: many waiters
//! sharing one deadline vs. spread across distinct deadlines.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use timerloop_core::{Coroutine, CoroutineRef, FinishReason};
use timerloop_rt::heap::TimerHeap;
use timerloop_rt::waiter::Waiter;

#[derive(Default)]
struct NoopCoroutine;

impl Coroutine for NoopCoroutine {
    fn start(&mut self) {}
    fn resume(&mut self) {}
    fn on_finish(&mut self, _reason: FinishReason) -> Option<CoroutineRef> {
        None
    }
    fn parent(&self) -> Option<CoroutineRef> {
        None
    }
}

fn bench_shared_deadline(c: &mut Criterion) {
    c.bench_function("heap_add_10k_shared_deadline", |b| {
        b.iter(|| {
            let mut heap = TimerHeap::new();
            for _ in 0..10_000 {
                let w = Waiter::new(Box::new(NoopCoroutine));
                heap.add(w.downgrade(), black_box(1_000));
            }
            black_box(heap.peek_deadline());
        });
    });
}

fn bench_distinct_deadlines(c: &mut Criterion) {
    c.bench_function("heap_add_10k_distinct_deadlines", |b| {
        b.iter(|| {
            let mut heap = TimerHeap::new();
            for i in 0..10_000u64 {
                let w = Waiter::new(Box::new(NoopCoroutine));
                heap.add(w.downgrade(), black_box(i));
            }
            black_box(heap.peek_deadline());
        });
    });
}

fn bench_drain_expired(c: &mut Criterion) {
    c.bench_function("heap_drain_expired_10k", |b| {
        b.iter_batched(
            || {
                let mut heap = TimerHeap::new();
                let mut keep_alive = Vec::with_capacity(10_000);
                for i in 0..10_000u64 {
                    let w = Waiter::new(Box::new(NoopCoroutine));
                    heap.add(w.downgrade(), i % 100);
                    keep_alive.push(w);
                }
                (heap, keep_alive)
            },
            |(mut heap, keep_alive)| {
                black_box(heap.drain_expired(u64::MAX));
                drop(keep_alive);
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_shared_deadline,
    bench_distinct_deadlines,
    bench_drain_expired
);
criterion_main!(benches);
