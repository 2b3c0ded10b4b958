//! Criterion benchmarks for the per-run hot paths.
//!
//! Benchmarks:
//! 1. Individual indicators over a typical and a long window
//! 2. Full indicator set + snapshot build
//! 3. Decision normalization of a fenced oracle reply

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signalcast_core::decision::{normalize_text, DecisionSchema};
use signalcast_core::domain::{Bar, PriceSeries};
use signalcast_core::indicators::{self, Atr, Ema, Indicator, Macd, Rsi};
use signalcast_core::snapshot;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar {
                timestamp: base + Duration::hours(4 * i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000.0 + (i % 500) as f64,
            }
        })
        .collect()
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let all: Vec<Box<dyn Indicator>> = vec![
        Box::new(Rsi::new(14)),
        Box::new(Ema::new(20)),
        Box::new(Ema::new(50)),
        Box::new(Atr::new(14)),
        Box::new(Macd::standard_signal()),
    ];

    for n in [100_usize, 1000] {
        let bars = make_bars(n);
        for ind in &all {
            group.bench_with_input(BenchmarkId::new(ind.name().to_string(), n), &bars, |b, bars| {
                b.iter(|| ind.compute(black_box(bars)))
            });
        }
    }
    group.finish();
}

// ── 2. Snapshot ──────────────────────────────────────────────────────

fn bench_snapshot(c: &mut Criterion) {
    let series = PriceSeries::new(make_bars(100)).unwrap();
    c.bench_function("indicator_set_100", |b| {
        b.iter(|| indicators::compute(black_box(&series)))
    });
    c.bench_function("snapshot_build_and_render_100", |b| {
        b.iter(|| {
            let snap = snapshot::build("BTC/USDT", black_box(&series)).unwrap();
            snap.render()
        })
    });
}

// ── 3. Normalization ─────────────────────────────────────────────────

fn bench_normalize(c: &mut Criterion) {
    let reply = "Here is my analysis:\n```json\n{\"signal\": \"LONG\", \"confidence\": 82, \
                 \"entry_price\": \"61000\", \"tp_price\": 63000, \"sl_price\": 60000, \
                 \"reason\": \"EMA20 above EMA50 and MACD crossing up\"}\n```";
    c.bench_function("normalize_fenced_reply", |b| {
        b.iter(|| normalize_text(black_box(reply), DecisionSchema::Directional))
    });
}

criterion_group!(benches, bench_indicators, bench_snapshot, bench_normalize);
criterion_main!(benches);
