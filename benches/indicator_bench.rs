use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use smi_signal_bot::indicators::{ema, ema_cloud, jma, ma_angles, smi, MaAngleSource, SmiParams};
use smi_signal_bot::{Bar, CandleStore, IndicatorEngine, SeriesKey};
use std::sync::Arc;

fn history(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let c = 0.6 + (i as f64 / 13.0).sin() * 0.02 + i as f64 * 1e-5;
            Bar::new(i as i64 * 60, c, c + 0.002, c - 0.002, c, 1000)
        })
        .collect()
}

/// Moving averages over a full window of closes
fn bench_moving_averages(c: &mut Criterion) {
    let close: Vec<f64> = history(2000).iter().map(|b| b.close).collect();
    let mut group = c.benchmark_group("moving_average");

    group.bench_function("ema_200", |b| {
        b.iter(|| black_box(ema(black_box(&close), 200)));
    });
    group.bench_function("jma_7", |b| {
        b.iter(|| black_box(jma(black_box(&close), 7, 50, 2)));
    });
    group.finish();
}

/// Each indicator result at growing history lengths
fn bench_indicators(c: &mut Criterion) {
    let params = SmiParams::default();
    let mut group = c.benchmark_group("indicators");

    for n in [300, 1000, 2000] {
        let bars = history(n);
        group.bench_with_input(BenchmarkId::new("smi", n), &bars, |b, bars| {
            b.iter(|| black_box(smi::calculate(bars, &params)));
        });
        group.bench_with_input(BenchmarkId::new("ema_cloud", n), &bars, |b, bars| {
            b.iter(|| black_box(ema_cloud::calculate(bars, 50, 200)));
        });
        group.bench_with_input(BenchmarkId::new("ma_angles", n), &bars, |b, bars| {
            b.iter(|| black_box(ma_angles::calculate(bars, MaAngleSource::Ema)));
        });
    }
    group.finish();
}

/// Full snapshot as run by the signal engine on every tick
fn bench_engine_snapshot(c: &mut Criterion) {
    let store = Arc::new(CandleStore::new());
    let key = SeriesKey::new("XRP_USDT", "1m");
    store.bulk_replace(&key, history(2000));
    let engine = IndicatorEngine::new(store);

    c.bench_function("engine_snapshot_2000", |b| {
        b.iter(|| {
            let snapshot = engine.snapshot(black_box(&key));
            black_box(snapshot.aligned());
        });
    });
}

criterion_group!(benches, bench_moving_averages, bench_indicators, bench_engine_snapshot);
criterion_main!(benches);
