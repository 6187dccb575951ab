//! Criterion benchmarks for the engine hot paths.
//!
//! Benchmarks:
//! 1. Full backtest replay over synthetic H1 data
//! 2. Market view construction per step
//! 3. Indicator batch computation (SMA, EMA, ATR, RSI, Donchian)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::{Duration, TimeZone, Utc};
use fxlab_core::domain::{Bar, RiskPolicy, Timeframe};
use fxlab_core::engine::BacktestRunner;
use fxlab_core::indicators::{atr, donchian, ema, rsi, sma};
use fxlab_core::sim::CostModel;
use fxlab_core::store::{BarSeries, BarStore};
use fxlab_core::strategy::{Genome, ParamValue, TemplateId};

fn make_store(n: usize) -> BarStore {
    let start = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    let mut prev = 1.1000;
    let bars: Vec<Bar> = (0..n)
        .map(|i| {
            let close = 1.1000 + (i as f64 * 0.05).sin() * 0.0200;
            let open = prev;
            prev = close;
            Bar {
                timestamp: start + Duration::hours(i as i64),
                timeframe: Timeframe::H1,
                open,
                high: open.max(close) + 0.0007,
                low: open.min(close) - 0.0007,
                close,
                volume: 1_000.0 + (i % 500) as f64,
            }
        })
        .collect();
    let mut store = BarStore::new("EURUSD", BarSeries::new(Timeframe::H1, bars).unwrap());
    store.derive(Timeframe::H4).unwrap();
    store
}

fn crossover_genome() -> Genome {
    Genome {
        template: TemplateId::MaCrossover,
        params: vec![
            ParamValue::Int(10),
            ParamValue::Int(60),
            ParamValue::Int(14),
            ParamValue::Float(2.0),
            ParamValue::Float(1.5),
            ParamValue::Bool(false),
            ParamValue::Int(20),
        ],
    }
}

fn bench_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest_replay");
    for n in [1_000usize, 10_000] {
        let store = make_store(n);
        let genome = crossover_genome();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let runner = BacktestRunner::new(
                &store,
                RiskPolicy::default(),
                CostModel::default(),
                10_000.0,
            )
            .unwrap();
            b.iter(|| black_box(runner.run_genome(&genome).unwrap()));
        });
    }
    group.finish();
}

fn bench_market_view(c: &mut Criterion) {
    let store = make_store(10_000);
    let timeframes = [Timeframe::H1, Timeframe::H4];
    c.bench_function("market_state_at", |b| {
        b.iter(|| {
            let state = store
                .market_state_at(black_box(9_000), &timeframes, 512)
                .unwrap();
            black_box(state.close(Timeframe::H1))
        })
    });
}

fn bench_indicators(c: &mut Criterion) {
    let store = make_store(2_000);
    let bars = store.base_series().bars();
    c.bench_function("indicator_batch", |b| {
        b.iter(|| {
            black_box(sma(bars, 50));
            black_box(ema(bars, 50));
            black_box(atr(bars, 14));
            black_box(rsi(bars, 14));
            black_box(donchian(bars, 20));
        })
    });
}

criterion_group!(benches, bench_backtest, bench_market_view, bench_indicators);
criterion_main!(benches);
