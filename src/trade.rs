//! Entry, stop and target derivation for a detected gap
//!
//! Entry sits at the gap midpoint (50% fill). The stop goes beyond the far edge
//! with an ATR cushion; targets are fixed multiples of the resulting risk.

use crate::{detectors::Gap, Direction};

// ============================================================
// DEFAULTS
// ============================================================

/// Stop cushion as a fraction of ATR
pub const CUSHION_ATR_FACTOR: f64 = 0.2;
/// First target in multiples of risk
pub const TP1_RISK_MULTIPLE: f64 = 1.5;
/// Second target in multiples of risk
pub const TP2_RISK_MULTIPLE: f64 = 2.5;
/// Floor applied to risk so the ratio is always defined
pub const MIN_RISK: f64 = 1e-12;

// ============================================================
// TRADE LEVELS
// ============================================================

/// Price levels for a single trade candidate
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeLevels {
  pub entry:         f64,
  pub stop_loss:     f64,
  pub take_profit_1: f64,
  pub take_profit_2: f64,
  /// Reward to the second target divided by risk
  pub risk_reward:   f64,
}

impl TradeLevels {
  /// Distance from entry to stop
  pub fn risk(&self) -> f64 {
    (self.entry - self.stop_loss).abs()
  }

  /// True when levels are strictly ordered for `direction`
  pub fn is_ordered(&self, direction: Direction) -> bool {
    match direction {
      Direction::Bullish => {
        self.stop_loss < self.entry
          && self.entry < self.take_profit_1
          && self.take_profit_1 < self.take_profit_2
      },
      Direction::Bearish => {
        self.take_profit_2 < self.take_profit_1
          && self.take_profit_1 < self.entry
          && self.entry < self.stop_loss
      },
    }
  }
}

// ============================================================
// PLANNER
// ============================================================

/// Deterministic trade level calculator
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradePlanner {
  pub cushion_atr_factor: f64,
  pub tp1_risk_multiple:  f64,
  pub tp2_risk_multiple:  f64,
}

impl Default for TradePlanner {
  fn default() -> Self {
    Self {
      cushion_atr_factor: CUSHION_ATR_FACTOR,
      tp1_risk_multiple:  TP1_RISK_MULTIPLE,
      tp2_risk_multiple:  TP2_RISK_MULTIPLE,
    }
  }
}

impl TradePlanner {
  pub fn with_defaults() -> Self {
    Self::default()
  }

  /// Stop cushion; 0 when ATR is unavailable or non-finite.
  #[inline]
  pub fn cushion(&self, atr: Option<f64>) -> f64 {
    match atr {
      Some(v) if v.is_finite() => self.cushion_atr_factor * v,
      _ => 0.0,
    }
  }

  /// Derive levels for `gap` traded in `direction`.
  ///
  /// `_price` is accepted for context and does not affect the result.
  pub fn plan(&self, direction: Direction, gap: &Gap, _price: f64, atr: Option<f64>) -> TradeLevels {
    let entry = gap.midpoint();
    let cushion = self.cushion(atr);

    match direction {
      Direction::Bullish => {
        let stop_loss = gap.low - cushion;
        let risk = (entry - stop_loss).max(MIN_RISK);
        let take_profit_2 = entry + self.tp2_risk_multiple * risk;
        TradeLevels {
          entry,
          stop_loss,
          take_profit_1: entry + self.tp1_risk_multiple * risk,
          take_profit_2,
          risk_reward: (take_profit_2 - entry) / risk,
        }
      },
      Direction::Bearish => {
        let stop_loss = gap.high + cushion;
        let risk = (stop_loss - entry).max(MIN_RISK);
        let take_profit_2 = entry - self.tp2_risk_multiple * risk;
        TradeLevels {
          entry,
          stop_loss,
          take_profit_1: entry - self.tp1_risk_multiple * risk,
          take_profit_2,
          risk_reward: (entry - take_profit_2) / risk,
        }
      },
    }
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  fn gap(direction: Direction, low: f64, high: f64) -> Gap {
    Gap::from_edges(direction, low, high).unwrap()
  }

  #[test]
  fn test_long_levels() {
    let levels = TradePlanner::default().plan(Direction::Bullish, &gap(Direction::Bullish, 100.0, 110.0), 112.0, Some(5.0));
    assert_eq!(levels.entry, 105.0);
    assert_eq!(levels.stop_loss, 99.0);
    assert_eq!(levels.risk(), 6.0);
    assert_eq!(levels.take_profit_1, 114.0);
    assert_eq!(levels.take_profit_2, 120.0);
    assert_eq!(levels.risk_reward, 2.5);
    assert!(levels.is_ordered(Direction::Bullish));
  }

  #[test]
  fn test_short_levels() {
    let levels = TradePlanner::default().plan(Direction::Bearish, &gap(Direction::Bearish, 100.0, 110.0), 98.0, Some(5.0));
    assert_eq!(levels.entry, 105.0);
    assert_eq!(levels.stop_loss, 111.0);
    assert_eq!(levels.take_profit_1, 96.0);
    assert_eq!(levels.take_profit_2, 90.0);
    assert_eq!(levels.risk_reward, 2.5);
    assert!(levels.is_ordered(Direction::Bearish));
  }

  #[test]
  fn test_missing_atr_means_no_cushion() {
    let planner = TradePlanner::default();
    let g = gap(Direction::Bullish, 100.0, 110.0);
    let levels = planner.plan(Direction::Bullish, &g, 112.0, None);
    assert_eq!(levels.stop_loss, 100.0);
    assert_eq!(planner.cushion(Some(f64::NAN)), 0.0);
    assert_eq!(planner.cushion(Some(f64::INFINITY)), 0.0);
  }

  #[test]
  fn test_price_does_not_affect_levels() {
    let planner = TradePlanner::default();
    let g = gap(Direction::Bullish, 10.0, 12.0);
    assert_eq!(planner.plan(Direction::Bullish, &g, 1.0, Some(1.0)), planner.plan(Direction::Bullish, &g, 1000.0, Some(1.0)));
  }

  #[test]
  fn test_negative_atr_can_floor_risk() {
    // A cushion that pulls the stop past entry floors risk at MIN_RISK
    let planner = TradePlanner::default();
    let g = gap(Direction::Bullish, 100.0, 102.0);
    let levels = planner.plan(Direction::Bullish, &g, 101.0, Some(-50.0));
    assert!(levels.risk_reward.is_finite());
    assert!(levels.risk_reward >= 0.0);
  }
}
