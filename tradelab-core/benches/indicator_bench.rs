//! Criterion benchmarks for indicator precompute and per-bar signal queries.
//!
//! Run with: `cargo bench -p tradelab-core`

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tradelab_core::indicators::{compute_atr, compute_supertrend};
use tradelab_core::{PriceBar, StrategyRegistry};

/// Deterministic oscillating series for benchmarking.
fn generate_bars(count: usize) -> Vec<PriceBar> {
    let mut prev = 100.0;
    (0..count)
        .map(|i| {
            let close = 100.0 + 10.0 * (i as f64 * 0.05).sin() + (i % 7) as f64 * 0.3;
            let bar = PriceBar::new(
                i as i64 * 60_000,
                prev,
                prev.max(close) + 0.5,
                prev.min(close) - 0.5,
                close,
                1_000.0,
            );
            prev = close;
            bar
        })
        .collect()
}

fn bench_supertrend(c: &mut Criterion) {
    let mut group = c.benchmark_group("supertrend");

    for size in [1_000, 10_000, 100_000].iter() {
        let bars = generate_bars(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let atr = compute_atr(black_box(&bars), 14);
                let _ = compute_supertrend(black_box(&bars), &atr, 3.0);
            });
        });
    }

    group.finish();
}

fn bench_signal_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_scan");
    let registry = StrategyRegistry::with_builtins();

    for name in ["SuperTrend", "MovingAverage", "RSI", "MACD"] {
        let bars = generate_bars(10_000);
        let strategy = match registry.build(name, &BTreeMap::new()) {
            Ok(s) => s,
            Err(_) => continue,
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &name, |b, _| {
            b.iter(|| {
                let prepared = strategy.prepare(black_box(&bars));
                (0..bars.len())
                    .filter(|&i| !prepared.signal_at(&bars, i).is_hold())
                    .count()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_supertrend, bench_signal_scan);
criterion_main!(benches);
