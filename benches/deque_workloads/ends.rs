use block_deque::BlockDeque;
use criterion::{black_box, Criterion, Throughput};
use std::collections::VecDeque;

const OPS: usize = 100_000;

pub fn run(c: &mut Criterion) {
    bench_push_back(c);
    bench_push_front(c);
    bench_fifo(c);
}

fn bench_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("ends_push_back");
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("BlockDeque", |b| {
        b.iter(|| {
            let mut deque: BlockDeque<u64> = BlockDeque::new();
            for i in 0..OPS as u64 {
                deque.push_back(black_box(i));
            }
            black_box(deque);
        })
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::new();
            for i in 0..OPS as u64 {
                deque.push_back(black_box(i));
            }
            black_box(deque);
        })
    });

    group.finish();
}

fn bench_push_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("ends_push_front");
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("BlockDeque", |b| {
        b.iter(|| {
            let mut deque: BlockDeque<u64> = BlockDeque::new();
            for i in 0..OPS as u64 {
                deque.push_front(black_box(i));
            }
            black_box(deque);
        })
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::new();
            for i in 0..OPS as u64 {
                deque.push_front(black_box(i));
            }
            black_box(deque);
        })
    });

    group.finish();
}

/// Queue usage: the window drifts towards the back while the size stays small.
fn bench_fifo(c: &mut Criterion) {
    let mut group = c.benchmark_group("ends_fifo");
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("BlockDeque", |b| {
        b.iter(|| {
            let mut deque: BlockDeque<u64> = (0..64).collect();
            for i in 0..OPS as u64 {
                deque.push_back(i);
                black_box(deque.pop_front());
            }
            black_box(deque);
        })
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| {
            let mut deque: VecDeque<u64> = (0..64).collect();
            for i in 0..OPS as u64 {
                deque.push_back(i);
                black_box(deque.pop_front());
            }
            black_box(deque);
        })
    });

    group.finish();
}
