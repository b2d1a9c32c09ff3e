//! Criterion micro-benchmarks for arena insert, take, and clear.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use vouch_arena::CheckArena;

fn bench_insert_take_clear_4k(c: &mut Criterion) {
    let mut arena: CheckArena<u64> = CheckArena::with_capacity(4_096);
    c.bench_function("insert_take_clear_4k", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4_096u64).map(|i| arena.insert(i).unwrap()).collect();
            let mut sum = 0u64;
            for h in handles.into_iter().rev() {
                sum = sum.wrapping_add(arena.take(h).unwrap());
            }
            black_box(sum);
            black_box(arena.clear());
        });
    });
}

fn bench_clear_with_leftovers(c: &mut Criterion) {
    let mut arena: CheckArena<Vec<u8>> = CheckArena::with_capacity(1_024);
    c.bench_function("clear_1k_leftovers", |b| {
        b.iter(|| {
            for _ in 0..1_024 {
                let _ = arena.insert(vec![0u8; 32]).unwrap();
            }
            black_box(arena.clear());
        });
    });
}

fn bench_stale_handle_rejection(c: &mut Criterion) {
    let mut arena: CheckArena<u64> = CheckArena::new();
    let stale = arena.insert(1).unwrap();
    arena.clear();
    c.bench_function("stale_take", |b| {
        b.iter(|| black_box(arena.take(black_box(stale)).is_err()));
    });
}

criterion_group!(
    benches,
    bench_insert_take_clear_4k,
    bench_clear_with_leftovers,
    bench_stale_handle_rejection
);
criterion_main!(benches);
