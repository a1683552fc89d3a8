//! Parameter metadata for screener configuration
//!
//! This module describes every tunable knob of [`ScreenerConfig`], enabling:
//! - Grid search optimization
//! - Parameter documentation
//! - Building a configuration from a flat name -> value map
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use fvg_screener::screener::ScreenerConfig;
//!
//! for param in ScreenerConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("trend_period", 50.0);
//! let config = ScreenerConfig::with_params(&params).unwrap();
//! assert_eq!(config.trend_period.get(), 50);
//! ```

use std::collections::HashMap;

use crate::{screener::ScreenerConfig, Period, Ratio, Result, ScreenerError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0)
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Non-negative multiple, e.g. a risk-reward floor
  Multiple,
  /// Boolean encoded as 0.0 / 1.0
  Flag,
  /// Positive count
  Count,
}

/// Metadata for a single configuration parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "trend_period")
  pub name:        &'static str,
  pub param_type:  ParamType,
  pub default:     f64,
  /// Range for optimization: (min, max, step)
  pub range:       (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn multiple(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self { name, param_type: ParamType::Multiple, default, range, description }
  }

  pub const fn flag(name: &'static str, default: bool, description: &'static str) -> Self {
    let default = if default { 1.0 } else { 0.0 };
    Self { name, param_type: ParamType::Flag, default, range: (0.0, 1.0, 1.0), description }
  }

  pub const fn count(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self { name, param_type: ParamType::Count, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(ScreenerError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio | ParamType::Multiple => Ok(()),
      ParamType::Period | ParamType::Count => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(ScreenerError::InvalidValue("Period and count values must be positive integers"));
        }
        Ok(())
      },
      ParamType::Flag => {
        if value != 0.0 && value != 1.0 {
          return Err(ScreenerError::InvalidValue("Flag must be 0 or 1"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// SCREENER PARAMETERS
// ============================================================

static SCREENER_PARAMS: &[ParamMeta] = &[
  ParamMeta::period("trend_period", 200.0, (20.0, 400.0, 20.0), "EMA period of the trend filter"),
  ParamMeta::period("momentum_period", 14.0, (5.0, 30.0, 1.0), "RSI period of the momentum filter"),
  ParamMeta::period("volatility_period", 14.0, (5.0, 30.0, 1.0), "ATR period used for stop cushion and scoring"),
  ParamMeta::period("calibration_window", 100.0, (10.0, 500.0, 10.0), "Prior candles sampled for the adaptive gap threshold"),
  ParamMeta::flag("adaptive_threshold", true, "Use the adaptive displacement threshold instead of 0"),
  ParamMeta::ratio("min_confidence", 0.60, (0.0, 1.0, 0.05), "Minimum confidence score to keep a candidate"),
  ParamMeta::multiple("min_risk_reward", 1.5, (0.0, 5.0, 0.5), "Minimum risk-reward to keep a candidate"),
  ParamMeta::count("max_per_side", 25.0, (1.0, 500.0, 1.0), "Maximum candidates kept per side"),
];

impl ScreenerConfig {
  /// Metadata for all configurable parameters
  pub fn param_meta() -> &'static [ParamMeta] {
    SCREENER_PARAMS
  }

  /// Build a configuration from a name -> value map.
  ///
  /// Missing parameters use their defaults; unknown names are rejected.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    for (key, value) in params {
      let meta = SCREENER_PARAMS
        .iter()
        .find(|m| m.name == *key)
        .ok_or_else(|| ScreenerError::InvalidConfig(format!("unknown parameter: {key}")))?;
      meta.validate(*value)?;
    }

    let defaults = ScreenerConfig::default();
    let config = ScreenerConfig {
      trend_period:       get_period(params, "trend_period", defaults.trend_period.get())?,
      momentum_period:    get_period(params, "momentum_period", defaults.momentum_period.get())?,
      volatility_period:  get_period(params, "volatility_period", defaults.volatility_period.get())?,
      calibration_window: get_period(params, "calibration_window", defaults.calibration_window.get())?,
      adaptive_threshold: get_flag(params, "adaptive_threshold", defaults.adaptive_threshold),
      min_confidence:     get_ratio(params, "min_confidence", defaults.min_confidence.get())?,
      min_risk_reward:    params.get("min_risk_reward").copied().unwrap_or(defaults.min_risk_reward),
      max_per_side:       params.get("max_per_side").map(|v| *v as usize).unwrap_or(defaults.max_per_side),
      validate_data:      defaults.validate_data,
    };
    config.validate()?;
    Ok(config)
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  Period::new(value as usize)
}

/// Helper to get a flag (non-zero is true) from params with default fallback
pub fn get_flag(params: &HashMap<&str, f64>, key: &str, default: bool) -> bool {
  params.get(key).map(|v| *v != 0.0).unwrap_or(default)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  fn meta(name: &str) -> &'static ParamMeta {
    ScreenerConfig::param_meta().iter().find(|m| m.name == name).unwrap()
  }

  #[test]
  fn test_every_knob_described_once() {
    let names: Vec<&str> = ScreenerConfig::param_meta().iter().map(|m| m.name).collect();
    assert_eq!(names.len(), 8);
    for name in &names {
      assert_eq!(names.iter().filter(|n| *n == name).count(), 1, "{name} listed twice");
    }
    assert_eq!(meta("min_confidence").param_type, ParamType::Ratio);
    assert_eq!(meta("max_per_side").param_type, ParamType::Count);
  }

  #[test]
  fn test_confidence_grid() {
    let grid = meta("min_confidence").generate_grid();
    assert_eq!(grid.len(), 21);
    assert_eq!(grid[0], 0.0);
    assert!((grid[12] - 0.6).abs() < 1e-9);
    assert!((grid[20] - 1.0).abs() < 1e-9);
  }

  #[test]
  fn test_validate_trend_period() {
    let trend = meta("trend_period");
    assert!(trend.validate(200.0).is_ok());
    assert!(trend.validate(20.0).is_ok());
    assert!(trend.validate(10.0).is_err());
    assert!(trend.validate(50.5).is_err());
    assert!(trend.validate(f64::NAN).is_err());
  }

  #[test]
  fn test_validate_flag() {
    let meta = ParamMeta::flag("f", true, "Test");
    assert_eq!(meta.default, 1.0);
    assert!(meta.validate(0.0).is_ok());
    assert!(meta.validate(0.5).is_err());
  }

  #[test]
  fn test_defaults_match_config() {
    let config = ScreenerConfig::default();
    let lookup = |name: &str| ScreenerConfig::param_meta().iter().find(|m| m.name == name).unwrap().default;

    assert_eq!(lookup("trend_period"), config.trend_period.get() as f64);
    assert_eq!(lookup("momentum_period"), config.momentum_period.get() as f64);
    assert_eq!(lookup("volatility_period"), config.volatility_period.get() as f64);
    assert_eq!(lookup("calibration_window"), config.calibration_window.get() as f64);
    assert_eq!(lookup("min_confidence"), config.min_confidence.get());
    assert_eq!(lookup("min_risk_reward"), config.min_risk_reward);
    assert_eq!(lookup("max_per_side"), config.max_per_side as f64);
  }

  #[test]
  fn test_with_params() {
    let mut params = HashMap::new();
    params.insert("trend_period", 100.0);
    params.insert("adaptive_threshold", 0.0);
    params.insert("min_confidence", 0.7);

    let config = ScreenerConfig::with_params(&params).unwrap();
    assert_eq!(config.trend_period.get(), 100);
    assert!(!config.adaptive_threshold);
    assert_eq!(config.min_confidence.get(), 0.7);
    assert_eq!(config.momentum_period.get(), 14);
  }

  #[test]
  fn test_with_params_rejects_unknown_and_out_of_range() {
    let mut unknown = HashMap::new();
    unknown.insert("ema_len", 50.0);
    assert!(matches!(ScreenerConfig::with_params(&unknown), Err(ScreenerError::InvalidConfig(_))));

    let mut out_of_range = HashMap::new();
    out_of_range.insert("min_confidence", 1.2);
    assert!(matches!(ScreenerConfig::with_params(&out_of_range), Err(ScreenerError::OutOfRange { .. })));
  }

  #[test]
  fn test_value_helpers_fall_back_to_defaults() {
    let mut params = HashMap::new();
    params.insert("momentum_period", 21.0);
    params.insert("adaptive_threshold", 0.0);

    assert_eq!(get_period(&params, "momentum_period", 14).unwrap().get(), 21);
    assert_eq!(get_period(&params, "volatility_period", 14).unwrap().get(), 14);
    assert_eq!(get_ratio(&params, "min_confidence", 0.6).unwrap().get(), 0.6);
    assert!(!get_flag(&params, "adaptive_threshold", true));
    assert!(get_period(&params, "trend_period", 0).is_err());
  }
}
