//! Criterion benchmarks for the scoring hot path.
//!
//! Benchmarks:
//! 1. Indicator frame construction over 500 bars
//! 2. Full `evaluate` over 500 bars
//! 3. A batch of 50 symbols evaluated back to back

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use scanlab_core::domain::{Bar, PriceSeries, SupplySnapshot};
use scanlab_core::{evaluate, IndicatorFrame, ScanConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(symbol: &str, n: usize, phase: f64) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 10_000.0 + ((i as f64 * 0.1) + phase).sin() * 500.0 + i as f64 * 2.0;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 15.0,
                high: close + 60.0,
                low: close - 60.0,
                close,
                volume: 1_000_000 + (i as u64 * 7_919) % 800_000,
            }
        })
        .collect();
    PriceSeries::from_unsorted(symbol, bars)
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_frame(c: &mut Criterion) {
    let cfg = ScanConfig::default();
    let mut group = c.benchmark_group("frame");
    for n in [250usize, 500] {
        let series = make_series("BENCH", n, 0.0);
        group.bench_with_input(BenchmarkId::new("compute", n), &series, |b, s| {
            b.iter(|| IndicatorFrame::compute(black_box(s), black_box(&cfg)))
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let cfg = ScanConfig::default();
    let series = make_series("BENCH", 500, 0.0);
    let supply = SupplySnapshot {
        foreign_consecutive_buy: 4,
        inst_consecutive_buy: 2,
        foreign_net_buy_5d: 1.0e9,
        inst_net_buy_5d: 5.0e8,
    };

    let mut group = c.benchmark_group("evaluate");
    group.bench_function("500_bars", |b| {
        b.iter(|| evaluate(black_box(&series), black_box(&cfg), None))
    });
    group.bench_function("500_bars_with_supply", |b| {
        b.iter(|| evaluate(black_box(&series), black_box(&cfg), Some(black_box(&supply))))
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let cfg = ScanConfig::default();
    let universe: Vec<PriceSeries> = (0..50)
        .map(|i| make_series(&format!("S{i:03}"), 500, i as f64 * 0.37))
        .collect();

    let mut group = c.benchmark_group("batch");
    group.bench_function("50_symbols_500_bars", |b| {
        b.iter(|| {
            universe
                .iter()
                .filter_map(|s| evaluate(black_box(s), &cfg, None))
                .count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_frame, bench_evaluate, bench_batch);
criterion_main!(benches);
