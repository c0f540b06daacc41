use super::XorShift64;
use block_deque::BlockDeque;
use criterion::{black_box, BatchSize, Criterion, Throughput};
use std::collections::VecDeque;

const SIZE: usize = 10_000;
const OPS: usize = 1_000;

pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("middle_insert_erase");
    group.throughput(Throughput::Elements(OPS as u64 * 2));

    group.bench_function("BlockDeque", |b| {
        b.iter_batched(
            || (0..SIZE as u32).collect::<BlockDeque<u32>>(),
            |mut deque| {
                let mut rng = XorShift64::new(0xdead_beef);
                for i in 0..OPS as u32 {
                    let at = rng.below(deque.len() + 1);
                    deque.insert(at, i);
                    let at = rng.below(deque.len());
                    black_box(deque.erase(at));
                }
                deque
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter_batched(
            || (0..SIZE as u32).collect::<VecDeque<u32>>(),
            |mut deque| {
                let mut rng = XorShift64::new(0xdead_beef);
                for i in 0..OPS as u32 {
                    let at = rng.below(deque.len() + 1);
                    deque.insert(at, i);
                    let at = rng.below(deque.len());
                    black_box(deque.remove(at));
                }
                deque
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}
