use super::XorShift64;
use block_deque::BlockDeque;
use criterion::{black_box, Criterion, Throughput};
use std::collections::VecDeque;

const SIZE: usize = 100_000;

pub fn run(c: &mut Criterion) {
    bench_random_index(c);
    bench_iterate(c);
}

/// Builds both containers with a window that starts mid-block.
fn build() -> (BlockDeque<u64>, VecDeque<u64>) {
    let mut deque = BlockDeque::new();
    let mut model = VecDeque::new();
    for i in 0..SIZE as u64 {
        if i % 3 == 0 {
            deque.push_front(i);
            model.push_front(i);
        } else {
            deque.push_back(i);
            model.push_back(i);
        }
    }
    (deque, model)
}

fn bench_random_index(c: &mut Criterion) {
    let (deque, model) = build();
    let mut group = c.benchmark_group("access_random_index");
    group.throughput(Throughput::Elements(SIZE as u64));

    group.bench_function("BlockDeque", |b| {
        b.iter(|| {
            let mut rng = XorShift64::new(42);
            let mut sum = 0u64;
            for _ in 0..SIZE {
                sum = sum.wrapping_add(deque[rng.below(SIZE)]);
            }
            black_box(sum)
        })
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| {
            let mut rng = XorShift64::new(42);
            let mut sum = 0u64;
            for _ in 0..SIZE {
                sum = sum.wrapping_add(model[rng.below(SIZE)]);
            }
            black_box(sum)
        })
    });

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let (deque, model) = build();
    let mut group = c.benchmark_group("access_iterate");
    group.throughput(Throughput::Elements(SIZE as u64));

    group.bench_function("BlockDeque", |b| {
        b.iter(|| black_box(deque.iter().fold(0u64, |acc, &v| acc.wrapping_add(v))))
    });

    group.bench_function("BlockDeque cursor", |b| {
        b.iter(|| {
            let mut cursor = deque.begin();
            let end = deque.end();
            let mut sum = 0u64;
            while cursor != end {
                // SAFETY: every position in `begin..end` is live.
                sum = sum.wrapping_add(unsafe { *cursor.get_unchecked() });
                cursor.move_next();
            }
            black_box(sum)
        })
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| black_box(model.iter().fold(0u64, |acc, &v| acc.wrapping_add(v))))
    });

    group.finish();
}
