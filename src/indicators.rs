//! Trend, momentum and volatility indicators
//!
//! Every function returns a series aligned 1:1 with its input. Entries that lack
//! enough history are `None`; callers must treat them as unavailable and never
//! compare them numerically.
//!
//! - [`ema`]: exponential moving average seeded with the first value (no warm-up gap)
//! - [`rsi`]: Wilder's smoothed relative strength index
//! - [`atr`]: Wilder RMA of true range

use crate::{Ohlc, Period, Result, ScreenerError};

// ============================================================
// EMA
// ============================================================

/// Exponential moving average with `k = 2 / (period + 1)`.
///
/// The first output equals `values[0]`, so the series is defined from index 0.
/// Values near the start of a short series are biased toward the seed.
pub fn ema(values: &[f64], period: Period) -> Vec<Option<f64>> {
  let k = 2.0 / (period.get() as f64 + 1.0);
  let mut out = Vec::with_capacity(values.len());
  let mut prev: Option<f64> = None;

  for &v in values {
    let next = match prev {
      None => v,
      Some(p) => v * k + p * (1.0 - k),
    };
    out.push(Some(next));
    prev = Some(next);
  }

  out
}

// ============================================================
// RSI
// ============================================================

#[inline]
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
  // avg_loss == 0 means rs is infinite
  if avg_loss == 0.0 {
    return 100.0;
  }
  let rs = avg_gain / avg_loss;
  100.0 - 100.0 / (1.0 + rs)
}

/// Wilder's RSI.
///
/// Indices `0..period` are undefined. The seed at index `period` uses the
/// arithmetic mean of the first `period` gains and losses; later entries apply
/// Wilder smoothing `avg = (avg * (period - 1) + x) / period`.
pub fn rsi(closes: &[f64], period: Period) -> Vec<Option<f64>> {
  let n = closes.len();
  let p = period.get();
  let mut out = vec![None; n];
  if n <= p {
    return out;
  }

  let mut avg_gain = 0.0;
  let mut avg_loss = 0.0;
  for i in 1..=p {
    let change = closes[i] - closes[i - 1];
    avg_gain += change.max(0.0);
    avg_loss += (-change).max(0.0);
  }
  avg_gain /= p as f64;
  avg_loss /= p as f64;
  out[p] = Some(rsi_from_averages(avg_gain, avg_loss));

  let pf = p as f64;
  for i in (p + 1)..n {
    let change = closes[i] - closes[i - 1];
    avg_gain = (avg_gain * (pf - 1.0) + change.max(0.0)) / pf;
    avg_loss = (avg_loss * (pf - 1.0) + (-change).max(0.0)) / pf;
    out[i] = Some(rsi_from_averages(avg_gain, avg_loss));
  }

  out
}

// ============================================================
// ATR
// ============================================================

#[inline]
fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
  (high - low).max((high - prev_close).abs()).max((low - prev_close).abs())
}

/// Average true range using Wilder's RMA.
///
/// True range is undefined at index 0. The seed at index `period` is the mean of
/// `TR[1..=period]`; afterwards `ATR[i] = ATR[i-1] - ATR[i-1]/period + TR[i]/period`.
///
/// Returns [`ScreenerError::LengthMismatch`] when the three inputs differ in length.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: Period) -> Result<Vec<Option<f64>>> {
  if highs.len() != lows.len() || highs.len() != closes.len() {
    return Err(ScreenerError::LengthMismatch {
      highs:  highs.len(),
      lows:   lows.len(),
      closes: closes.len(),
    });
  }

  let n = closes.len();
  let p = period.get();
  let mut out = vec![None; n];
  if n <= p {
    return Ok(out);
  }

  let tr = |i: usize| true_range(highs[i], lows[i], closes[i - 1]);

  let seed = (1..=p).map(tr).sum::<f64>() / p as f64;
  out[p] = Some(seed);

  let alpha = 1.0 / p as f64;
  let mut prev = seed;
  for i in (p + 1)..n {
    prev = prev - alpha * prev + alpha * tr(i);
    out[i] = Some(prev);
  }

  Ok(out)
}

// ============================================================
// INDICATOR SERIES
// ============================================================

/// Trend (EMA), momentum (RSI) and volatility (ATR) aligned with a candle series
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
  pub trend:      Vec<Option<f64>>,
  pub momentum:   Vec<Option<f64>>,
  pub volatility: Vec<Option<f64>>,
}

/// Indicator readings at the most recent candle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatestReadings {
  pub trend:      Option<f64>,
  pub momentum:   Option<f64>,
  pub volatility: Option<f64>,
}

impl IndicatorSeries {
  /// Compute all three series over `candles` closes/highs/lows.
  pub fn compute<T: Ohlc>(
    candles: &[T],
    trend_period: Period,
    momentum_period: Period,
    volatility_period: Period,
  ) -> Result<Self> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close()).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high()).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low()).collect();

    Ok(Self {
      trend:      ema(&closes, trend_period),
      momentum:   rsi(&closes, momentum_period),
      volatility: atr(&highs, &lows, &closes, volatility_period)?,
    })
  }

  pub fn len(&self) -> usize {
    self.trend.len()
  }

  pub fn is_empty(&self) -> bool {
    self.trend.is_empty()
  }

  /// Readings at the last index; all `None` for an empty series.
  pub fn latest(&self) -> LatestReadings {
    LatestReadings {
      trend:      self.trend.last().copied().flatten(),
      momentum:   self.momentum.last().copied().flatten(),
      volatility: self.volatility.last().copied().flatten(),
    }
  }
}

// ============================================================
// TESTS
// ============================================================
