use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pullstream::Stream;

fn cpu_bound(x: u64) -> u64 {
    (0..1000).fold(x, |acc, i| acc.wrapping_mul(i + 1))
}

pub fn bench_map_concurrency(c: &mut Criterion) {
    let mut group = c.benchmark_group("map-concurrency");
    for concurrency in [1, 2, 4, 8] {
        group.bench_function(format!("concurrency={concurrency}"), |b| {
            b.iter(|| {
                let stream = Stream::source(|| 0..200u64).map(black_box(cpu_bound), concurrency);
                let out: Vec<_> = (&stream).into_iter().collect();
                black_box(out)
            })
        });
    }
    group.finish();
}

pub fn bench_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch-size");
    for size in [1, 16, 64] {
        group.bench_function(format!("size={size}"), |b| {
            b.iter(|| {
                let stream = Stream::source(|| 0..10_000u64).batch(size, None);
                let out: Vec<_> = (&stream).into_iter().collect();
                black_box(out)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_map_concurrency, bench_batch_sizes);
criterion_main!(benches);
