//! # fvg-screener - Fair Value Gap Screener
//!
//! Screens a universe of instruments for three-candle fair value gaps that are
//! confirmed by trend (EMA), momentum (RSI) and volatility (ATR), and produces
//! ranked trade candidates with entry, stop, two targets, a risk-reward figure
//! and a heuristic confidence score.
//!
//! ## Quick Start
//!
//! ```rust
//! use fvg_screener::prelude::*;
//!
//! let screener = ScreenerBuilder::new()
//!     .trend_period(50)
//!     .min_confidence(0.55)
//!     .build()
//!     .unwrap();
//!
//! let mut universe = InMemoryUniverse::new();
//! universe.insert("BTCUSDT", Vec::<Candle>::new());
//!
//! let result = screener.screen_universe(&universe).unwrap();
//! assert!(result.bullish.is_empty());
//! ```

pub mod detectors;
pub mod indicators;
pub mod params;
pub mod report;
pub mod scoring;
pub mod screener;
pub mod trade;
pub mod universe;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::{bar_delta_percent, FairValueGapDetector, Gap, GapDetection},
        // Indicators
        indicators::{atr, ema, rsi, IndicatorSeries},
        // Parameters
        params::{get_period, get_ratio, ParamMeta, ParamType},
        // Reporting
        report::{render_report, ReportHeader, RunSnapshot},
        // Scoring
        scoring::{ConfidenceScorer, ScoreInputs},
        // Screener
        screener::{
            Screener, ScreenerBuilder, ScreenerConfig, ScreeningResult, ScreeningStats,
            SymbolFailure, TradeCandidate,
        },
        // Trade parameters
        trade::{TradeLevels, TradePlanner},
        // Universe
        universe::{InMemoryUniverse, SingleSymbol, UniverseProvider},
        // Types
        Candle,
        Direction,
        OhlcExt,
        Period,
        Ratio,
        Result,
        ScreenerError,
        Ohlc,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScreenerError>;

/// Errors that can occur while configuring or running the screener
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScreenerError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },

    #[error("Mismatched series lengths: highs={highs}, lows={lows}, closes={closes}")]
    LengthMismatch {
        highs: usize,
        lows: usize,
        closes: usize,
    },

    #[error("Provider failed for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScreenerError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScreenerError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Clamp any finite value into [0.0, 1.0]. NaN maps to 0.0.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScreenerError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// CANDLE TRAITS
// ============================================================

/// Core OHLC data trait
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn open_time(&self) -> Option<i64> {
        None
    }
}

impl<T: Ohlc + ?Sized> Ohlc for &T {
    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn open_time(&self) -> Option<i64> {
        (**self).open_time()
    }
}

/// Extension trait with checks over OHLC data
pub trait OhlcExt: Ohlc {
    /// Validate OHLC data consistency
    fn validate(&self) -> Result<()> {
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(ScreenerError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(ScreenerError::InvalidCandle {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if self.high() < self.low() {
            return Err(ScreenerError::InvalidCandle {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc + ?Sized> OhlcExt for T {}

/// Validate every candle, reporting the first offending index.
pub fn validate_candles<T: Ohlc>(candles: &[T]) -> Result<()> {
    for (i, candle) in candles.iter().enumerate() {
        candle.validate().map_err(|e| match e {
            ScreenerError::InvalidCandle { reason, .. } => {
                ScreenerError::InvalidCandle { index: i, reason }
            }
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// CANDLE
// ============================================================

/// A single OHLC candle keyed by its open time (ms since epoch)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    #[serde(rename = "openTime", alias = "open_time", alias = "t")]
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
        }
    }
}

impl Ohlc for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn open_time(&self) -> Option<i64> {
        Some(self.open_time)
    }
}

// ============================================================
// DIRECTION
// ============================================================

/// Side of a gap or trade candidate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Bullish => "long",
            Direction::Bearish => "short",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// TESTS
// ============================================================
