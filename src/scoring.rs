//! Heuristic confidence score for a trade candidate
//!
//! Four additive terms (trend alignment, momentum distance, gap size, volatility)
//! are summed and mapped into [0, 1] via `clamp((sum + 1) / 2, 0, 1)`.
//! Multipliers are calibrated against the bar delta scale used by the detector.

use crate::{detectors::Gap, Direction, Ratio};

// ============================================================
// INPUTS
// ============================================================

/// Readings needed to score one candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
  pub direction:  Direction,
  pub price:      f64,
  /// Trend (EMA) value at the latest candle
  pub trend:      Option<f64>,
  /// Momentum (RSI) value at the latest candle
  pub momentum:   Option<f64>,
  /// Volatility (ATR) value at the latest candle
  pub volatility: Option<f64>,
  pub gap:        Gap,
}

/// Per-term contributions before normalization
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
  pub trend:      f64,
  pub momentum:   f64,
  pub gap:        f64,
  pub volatility: f64,
}

impl ScoreBreakdown {
  pub fn sum(&self) -> f64 {
    self.trend + self.momentum + self.gap + self.volatility
  }
}

// ============================================================
// SCORER
// ============================================================

/// Weighted heuristic scorer. Defaults reproduce the reference calibration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfidenceScorer {
  pub trend_aligned_bonus:         f64,
  pub trend_opposed_penalty:       f64,
  pub momentum_weight:             f64,
  pub momentum_wrong_side_penalty: f64,
  pub gap_multiplier:              f64,
  pub gap_cap:                     f64,
  pub volatility_multiplier:       f64,
  pub volatility_floor:            f64,
  pub volatility_cap:              f64,
}

impl Default for ConfidenceScorer {
  fn default() -> Self {
    Self {
      trend_aligned_bonus:         0.35,
      trend_opposed_penalty:       0.25,
      momentum_weight:             0.25,
      momentum_wrong_side_penalty: 0.15,
      gap_multiplier:              50.0,
      gap_cap:                     0.3,
      volatility_multiplier:       20.0,
      volatility_floor:            -0.1,
      volatility_cap:              0.2,
    }
  }
}

impl ConfidenceScorer {
  pub fn with_defaults() -> Self {
    Self::default()
  }

  fn trend_term(&self, inputs: &ScoreInputs) -> f64 {
    let aligned = match (inputs.direction, inputs.trend) {
      (Direction::Bullish, Some(t)) => inputs.price > t,
      (Direction::Bearish, Some(t)) => inputs.price < t,
      (_, None) => false,
    };
    if aligned {
      self.trend_aligned_bonus
    } else {
      -self.trend_opposed_penalty
    }
  }

  fn momentum_term(&self, inputs: &ScoreInputs) -> f64 {
    // Unavailable momentum contributes nothing
    let Some(m) = inputs.momentum.filter(|m| m.is_finite()) else {
      return 0.0;
    };
    let distance = ((m - 50.0).abs() / 50.0).min(1.0);
    let mut term = distance * self.momentum_weight;
    let wrong_side = match inputs.direction {
      Direction::Bullish => m < 50.0,
      Direction::Bearish => m > 50.0,
    };
    if wrong_side {
      term -= self.momentum_wrong_side_penalty;
    }
    term
  }

  fn gap_term(&self, inputs: &ScoreInputs) -> f64 {
    let fraction = if inputs.price > 0.0 { inputs.gap.size() / inputs.price } else { 0.0 };
    (fraction * self.gap_multiplier).min(self.gap_cap)
  }

  fn volatility_term(&self, inputs: &ScoreInputs) -> f64 {
    let fraction = match inputs.volatility {
      Some(v) if v.is_finite() && inputs.price > 0.0 => v / inputs.price,
      _ => 0.0,
    };
    (fraction * self.volatility_multiplier).clamp(self.volatility_floor, self.volatility_cap)
  }

  /// Individual term contributions
  pub fn breakdown(&self, inputs: &ScoreInputs) -> ScoreBreakdown {
    ScoreBreakdown {
      trend:      self.trend_term(inputs),
      momentum:   self.momentum_term(inputs),
      gap:        self.gap_term(inputs),
      volatility: self.volatility_term(inputs),
    }
  }

  /// Normalized confidence in [0, 1]
  pub fn score(&self, inputs: &ScoreInputs) -> Ratio {
    let sum = self.breakdown(inputs).sum();
    Ratio::saturating((sum + 1.0) / 2.0)
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  fn inputs(direction: Direction, momentum: Option<f64>) -> ScoreInputs {
    ScoreInputs {
      direction,
      price: 100.0,
      trend: Some(90.0),
      momentum,
      volatility: Some(2.0),
      gap: Gap::from_edges(direction, 95.0, 96.0).unwrap(),
    }
  }

  #[test]
  fn test_aligned_long_score() {
    // trend +0.35, momentum (70 -> 0.4 * 0.25 = 0.1), gap min(0.01*50, 0.3)=0.3, atr 0.02*20=0.4 -> 0.2
    let s = ConfidenceScorer::default().score(&inputs(Direction::Bullish, Some(70.0)));
    assert!((s.get() - (0.35 + 0.1 + 0.3 + 0.2 + 1.0) / 2.0).abs() < 1e-12);
  }

  #[test]
  fn test_opposed_short_score() {
    // price above trend for a short: -0.25; momentum 70 wrong side: 0.1 - 0.15
    let b = ConfidenceScorer::default().breakdown(&inputs(Direction::Bearish, Some(70.0)));
    assert_eq!(b.trend, -0.25);
    assert!((b.momentum - (0.1 - 0.15)).abs() < 1e-12);
  }

  #[test]
  fn test_undefined_momentum_skips_term() {
    let b = ConfidenceScorer::default().breakdown(&inputs(Direction::Bullish, None));
    assert_eq!(b.momentum, 0.0);
    let nan = ConfidenceScorer::default().breakdown(&inputs(Direction::Bullish, Some(f64::NAN)));
    assert_eq!(nan.momentum, 0.0);
  }

  #[test]
  fn test_undefined_trend_is_not_aligned() {
    let mut i = inputs(Direction::Bullish, Some(60.0));
    i.trend = None;
    assert_eq!(ConfidenceScorer::default().breakdown(&i).trend, -0.25);
  }

  #[test]
  fn test_volatility_term_bounds() {
    let scorer = ConfidenceScorer::default();
    let mut i = inputs(Direction::Bullish, Some(60.0));
    i.volatility = Some(-50.0);
    assert_eq!(scorer.breakdown(&i).volatility, -0.1);
    i.volatility = Some(1000.0);
    assert_eq!(scorer.breakdown(&i).volatility, 0.2);
    i.volatility = None;
    assert_eq!(scorer.breakdown(&i).volatility, 0.0);
  }

  #[test]
  fn test_non_positive_price() {
    let scorer = ConfidenceScorer::default();
    let mut i = inputs(Direction::Bullish, Some(60.0));
    i.price = 0.0;
    let b = scorer.breakdown(&i);
    assert_eq!(b.gap, 0.0);
    assert_eq!(b.volatility, 0.0);
    let s = scorer.score(&i).get();
    assert!((0.0..=1.0).contains(&s));
  }

  #[test]
  fn test_gap_term_monotonic_and_capped() {
    let scorer = ConfidenceScorer::default();
    let mut last = f64::MIN;
    for width in [0.01, 0.1, 0.2, 0.4, 0.6, 5.0] {
      let mut i = inputs(Direction::Bullish, Some(60.0));
      i.gap = Gap::from_edges(Direction::Bullish, 95.0, 95.0 + width).unwrap();
      let s = scorer.score(&i).get();
      assert!(s >= last);
      last = s;
    }
    let mut wide = inputs(Direction::Bullish, Some(60.0));
    wide.gap = Gap::from_edges(Direction::Bullish, 50.0, 99.0).unwrap();
    assert_eq!(scorer.breakdown(&wide).gap, 0.3);
  }
}
