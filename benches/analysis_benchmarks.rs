//! Analysis Benchmarks
//!
//! Reproducible timings for the three engines with 95% confidence intervals
//! (Criterion default).
//!
//! Run with: cargo bench --bench analysis_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use queuecalc::domains::{build_dd1k, mm, to_proper_fraction};

/// Continued-fraction expansion of rational and irrational-looking inputs.
fn bench_fraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fraction");
    group.sample_size(100);

    for (name, value) in [("5/6", 5.0 / 6.0), ("355/113", 355.0 / 113.0), ("pi", std::f64::consts::PI)] {
        group.bench_with_input(BenchmarkId::new("to_proper_fraction", name), &value, |b, &v| {
            b.iter(|| black_box(to_proper_fraction(black_box(v))));
        });
    }

    group.finish();
}

/// M/M/c/K steady state as the capacity grows.
fn bench_mmck(c: &mut Criterion) {
    let mut group = c.benchmark_group("MMcK");
    group.sample_size(100);

    group.bench_function("mm1_infinite", |b| {
        b.iter(|| black_box(mm(black_box(60.0), black_box(50.0), 1, None)));
    });

    for capacity in [10u32, 100, 500] {
        group.bench_with_input(BenchmarkId::new("mmck", capacity), &capacity, |b, &k| {
            b.iter(|| black_box(mm(2.4, 2.0, 4, Some(k))));
        });
    }

    group.finish();
}

/// D/D/1/K construction including the event trace, by initial backlog.
fn bench_dd1k(c: &mut Criterion) {
    let mut group = c.benchmark_group("DD1K");
    group.sample_size(50);

    for m in [5u64, 50, 500] {
        group.bench_with_input(BenchmarkId::new("draining", m), &m, |b, &m| {
            b.iter(|| black_box(build_dd1k(1.0 / 3.0, 0.5, 10, Some(m))));
        });
    }

    for capacity in [3u64, 30, 300] {
        group.bench_with_input(BenchmarkId::new("oscillating", capacity), &capacity, |b, &k| {
            b.iter(|| black_box(build_dd1k(3.0, 2.0, k, None)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fraction, bench_mmck, bench_dd1k);
criterion_main!(benches);
