//! Benchmarks for indicator computation, gap detection and universe screening.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fvg_screener::prelude::*;

/// Generate realistic candles
fn generate_candles(n: usize, seed: usize) -> Vec<Candle> {
  let mut candles = Vec::with_capacity(n);
  let mut price = 100.0 + seed as f64;

  for i in 0..n {
    let change = (((i + seed) * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + (((i + seed) * 3) % 10) as f64 / 5.0;

    let open = price;
    let close = (price + change).max(1.0);
    let high = open.max(close) + volatility * 0.5;
    let low = (open.min(close) - volatility * 0.5).max(0.5);

    candles.push(Candle::new(i as i64, open, high, low, close));
    price = close;
  }

  candles
}

fn bench_indicators(c: &mut Criterion) {
  let candles = generate_candles(1000, 0);
  let (trend, momentum, volatility) = (Period::new(200).unwrap(), Period::new(14).unwrap(), Period::new(14).unwrap());

  c.bench_function("indicator_series_1000_candles", |b| {
    b.iter(|| {
      let _ = black_box(IndicatorSeries::compute(black_box(&candles), trend, momentum, volatility));
    })
  });
}

fn bench_detect(c: &mut Criterion) {
  let candles = generate_candles(1000, 0);
  let detector = FairValueGapDetector::with_defaults();

  c.bench_function("detect_latest_1000_candles", |b| {
    b.iter(|| {
      let _ = black_box(detector.detect(black_box(&candles)));
    })
  });

  c.bench_function("scan_history_1000_candles", |b| {
    b.iter(|| {
      let _ = black_box(detector.scan_history(black_box(&candles)));
    })
  });
}

fn bench_evaluate_scaling(c: &mut Criterion) {
  let screener = Screener::with_defaults();

  let mut group = c.benchmark_group("evaluate");

  for size in [250, 500, 1000, 5000].iter() {
    let candles = generate_candles(*size, 0);

    group.bench_with_input(BenchmarkId::new("symbol", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(screener.evaluate("BENCH", black_box(&candles)));
      })
    });
  }

  group.finish();
}

fn bench_screen_universe(c: &mut Criterion) {
  let screener = Screener::with_defaults();

  let mut group = c.benchmark_group("screen_universe");

  for symbols in [10, 100, 400].iter() {
    let universe: InMemoryUniverse =
      (0..*symbols).map(|i| (format!("SYM{i}USDT"), generate_candles(500, i))).collect();

    group.bench_with_input(BenchmarkId::new("symbols", symbols), symbols, |b, _| {
      b.iter(|| {
        let _ = black_box(screener.screen_universe(black_box(&universe)));
      })
    });
  }

  group.finish();
}

criterion_group!(benches, bench_indicators, bench_detect, bench_evaluate_scaling, bench_screen_universe);

criterion_main!(benches);
