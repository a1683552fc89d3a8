//! Three-candle fair value gap detector
//!
//! Bullish: `curr.low > prev2.high`, `prev1.close > prev2.high` and
//! `delta(prev1) > threshold`. Bearish mirrors with lows, highs and `-delta(prev1)`.
//! Both sides are evaluated independently on every call.

use crate::{Direction, Ohlc, Period};

use super::helpers::{self, adaptive_threshold, candle_delta_percent};

// ============================================================
// GAP
// ============================================================

/// Untested price interval left by a three-candle displacement.
/// `low < high` always holds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Gap {
  pub direction: Direction,
  pub low:       f64,
  pub high:      f64,
}

impl Gap {
  /// Build a gap from two edges in any order. Returns `None` unless the edges
  /// describe a non-empty interval.
  pub fn from_edges(direction: Direction, a: f64, b: f64) -> Option<Self> {
    let low = a.min(b);
    let high = a.max(b);
    (high > low).then_some(Self { direction, low, high })
  }

  #[inline]
  pub fn size(&self) -> f64 {
    self.high - self.low
  }

  #[inline]
  pub fn midpoint(&self) -> f64 {
    (self.low + self.high) / 2.0
  }
}

/// Result of one detection call. Both sides may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GapDetection {
  pub bullish: Option<Gap>,
  pub bearish: Option<Gap>,
}

impl GapDetection {
  pub fn is_empty(&self) -> bool {
    self.bullish.is_none() && self.bearish.is_none()
  }

  /// Detected gaps, bullish first
  pub fn iter(&self) -> impl Iterator<Item = Gap> {
    self.bullish.into_iter().chain(self.bearish)
  }
}

// ============================================================
// DETECTOR
// ============================================================

/// Fair value gap detector with fixed (0) or adaptive displacement threshold
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FairValueGapDetector {
  /// Number of prior candles sampled when estimating the threshold
  pub window:   Period,
  /// `false` uses a threshold of 0
  pub adaptive: bool,
}

impl Default for FairValueGapDetector {
  fn default() -> Self {
    Self {
      window:   Period::new_const(helpers::DEFAULT_CALIBRATION_WINDOW),
      adaptive: true,
    }
  }
}

impl FairValueGapDetector {
  pub fn with_defaults() -> Self {
    Self::default()
  }

  /// Detector using a fixed threshold of 0
  pub fn fixed() -> Self {
    Self { adaptive: false, ..Self::default() }
  }

  pub fn new(window: Period, adaptive: bool) -> Self {
    Self { window, adaptive }
  }

  #[inline]
  pub fn min_candles(&self) -> usize {
    3
  }

  /// Displacement threshold for a gap completing at `index`.
  ///
  /// Samples the bar delta of up to `window` candles before `index`.
  pub fn threshold_at<T: Ohlc>(&self, candles: &[T], index: usize) -> f64 {
    if !self.adaptive || index == 0 {
      return 0.0;
    }
    let end = index.min(candles.len());
    let start = end.saturating_sub(self.window.get());
    let samples: Vec<f64> = candles[start..end].iter().map(candle_delta_percent).collect();
    adaptive_threshold(&samples, self.window.get())
  }

  /// Threshold for the most recent candle
  pub fn threshold<T: Ohlc>(&self, candles: &[T]) -> f64 {
    self.threshold_at(candles, candles.len().saturating_sub(1))
  }

  /// Detect gaps completed by the candle at `index`, using only history up to it.
  pub fn detect_at<T: Ohlc>(&self, candles: &[T], index: usize) -> GapDetection {
    if index < 2 || index >= candles.len() {
      return GapDetection::default();
    }
    let prev2 = &candles[index - 2];
    let prev1 = &candles[index - 1];
    let curr = &candles[index];

    let threshold = self.threshold_at(candles, index);
    let delta = candle_delta_percent(prev1);

    let mut detection = GapDetection::default();

    if curr.low() > prev2.high() && prev1.close() > prev2.high() && delta > threshold {
      detection.bullish = Gap::from_edges(Direction::Bullish, curr.low(), prev2.high());
    }

    if curr.high() < prev2.low() && prev1.close() < prev2.low() && -delta > threshold {
      detection.bearish = Gap::from_edges(Direction::Bearish, curr.high(), prev2.low());
    }

    detection
  }

  /// Detect gaps completed by the most recent candle.
  /// Fewer than three candles yields no gap.
  pub fn detect<T: Ohlc>(&self, candles: &[T]) -> GapDetection {
    match candles.len() {
      0..=2 => GapDetection::default(),
      n => self.detect_at(candles, n - 1),
    }
  }

  /// Every gap in the series as `(index, gap)` pairs, oldest first.
  pub fn scan_history<T: Ohlc>(&self, candles: &[T]) -> Vec<(usize, Gap)> {
    (2..candles.len())
      .flat_map(|i| self.detect_at(candles, i).iter().map(move |g| (i, g)).collect::<Vec<_>>())
      .collect()
  }
}

// ============================================================
// TESTS
// ============================================================
