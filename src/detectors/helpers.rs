//! Threshold math shared by the gap detector
//!
//! The bar delta scale divides by `open * 100`, matching the charting indicator the
//! detector reproduces. Scorer multipliers are calibrated against this scale, so it
//! must not be changed to a plain percentage.

use crate::Ohlc;

// ============================================================
// DEFAULTS
// ============================================================

/// Number of prior candles sampled for the adaptive threshold
pub const DEFAULT_CALIBRATION_WINDOW: usize = 100;
/// Adaptive threshold = THRESHOLD_MULTIPLIER * mean(|bar delta percent|)
pub const THRESHOLD_MULTIPLIER: f64 = 2.0;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// `(close - open) / (open * 100)`. Zero open yields 0.
#[inline]
pub fn bar_delta_percent(open: f64, close: f64) -> f64 {
    if open == 0.0 {
        return 0.0;
    }
    (close - open) / (open * 100.0)
}

/// Bar delta percent of a single candle
#[inline]
pub fn candle_delta_percent<T: Ohlc>(candle: &T) -> f64 {
    bar_delta_percent(candle.open(), candle.close())
}

/// `2 * mean(|x|)` over the last `window` samples (all of them if fewer).
/// Empty input yields 0.
pub fn adaptive_threshold(samples: &[f64], window: usize) -> f64 {
    let start = samples.len().saturating_sub(window);
    let sample = &samples[start..];
    if sample.is_empty() {
        return 0.0;
    }
    let mean = sample.iter().map(|x| x.abs()).sum::<f64>() / sample.len() as f64;
    THRESHOLD_MULTIPLIER * mean
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_delta_percent_scale() {
        // 1% move -> 0.0001 on this scale
        assert!((bar_delta_percent(100.0, 101.0) - 0.0001).abs() < 1e-15);
        assert!((bar_delta_percent(100.0, 99.0) + 0.0001).abs() < 1e-15);
    }

    #[test]
    fn test_bar_delta_percent_zero_open() {
        assert_eq!(bar_delta_percent(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_adaptive_threshold_empty() {
        assert_eq!(adaptive_threshold(&[], 100), 0.0);
    }

    #[test]
    fn test_adaptive_threshold_uses_absolute_values() {
        assert!((adaptive_threshold(&[0.001, -0.003], 100) - 0.004).abs() < 1e-15);
    }

    #[test]
    fn test_adaptive_threshold_window_keeps_latest() {
        // Only the last two samples count
        let t = adaptive_threshold(&[1.0, 0.002, 0.004], 2);
        assert!((t - 0.006).abs() < 1e-15);
    }
}
