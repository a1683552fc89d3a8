//! Screener orchestration
//!
//! For every symbol: skip short histories, compute indicators, detect gaps, then
//! run each gap through the confirmation gates (trend, momentum, risk-reward,
//! confidence). Accepted candidates are ranked per side by
//! `(confidence, risk_reward)` descending and truncated.
//!
//! Symbols are evaluated in parallel with rayon. Evaluation is pure, so ranking
//! after collection makes the result independent of completion order.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::{
  detectors::{FairValueGapDetector, Gap},
  indicators::{IndicatorSeries, LatestReadings},
  scoring::{ConfidenceScorer, ScoreInputs},
  trade::TradePlanner,
  universe::UniverseProvider,
  validate_candles, Direction, Ohlc, Period, Ratio, Result, ScreenerError,
};

// ============================================================
// CONFIGURATION
// ============================================================

/// Extra candles required beyond the longest indicator period
pub const HISTORY_MARGIN: usize = 5;

/// Screener configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
  /// Trend EMA period
  pub trend_period:       Period,
  /// Momentum RSI period
  pub momentum_period:    Period,
  /// Volatility ATR period
  pub volatility_period:  Period,
  /// Prior candles sampled for the adaptive gap threshold
  pub calibration_window: Period,
  pub adaptive_threshold: bool,
  pub min_confidence:     Ratio,
  pub min_risk_reward:    f64,
  /// Maximum candidates kept per side
  pub max_per_side:       usize,
  /// Reject histories containing NaN, infinite or inverted candles
  pub validate_data:      bool,
}

impl Default for ScreenerConfig {
  fn default() -> Self {
    Self {
      trend_period:       Period::new_const(200),
      momentum_period:    Period::new_const(14),
      volatility_period:  Period::new_const(14),
      calibration_window: Period::new_const(100),
      adaptive_threshold: true,
      min_confidence:     Ratio::new_const(0.60),
      min_risk_reward:    1.5,
      max_per_side:       25,
      validate_data:      true,
    }
  }
}

impl ScreenerConfig {
  /// Minimum history for full scoring
  pub fn min_candles(&self) -> usize {
    self
      .trend_period
      .get()
      .max(self.volatility_period.get())
      .max(self.momentum_period.get())
      + HISTORY_MARGIN
  }

  pub fn validate(&self) -> Result<()> {
    if !self.min_risk_reward.is_finite() {
      return Err(ScreenerError::InvalidValue("min_risk_reward must be finite"));
    }
    if self.min_risk_reward < 0.0 {
      return Err(ScreenerError::OutOfRange {
        field: "min_risk_reward",
        value: self.min_risk_reward,
        min:   0.0,
        max:   f64::MAX,
      });
    }
    if self.max_per_side == 0 {
      return Err(ScreenerError::InvalidConfig("max_per_side must be > 0".to_string()));
    }
    Ok(())
  }
}

// ============================================================
// RESULT TYPES
// ============================================================

/// A ranked, parameterized trade candidate
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeCandidate {
  pub symbol:        String,
  pub direction:     Direction,
  /// Latest close
  pub price:         f64,
  pub gap_low:       f64,
  pub gap_high:      f64,
  pub entry:         f64,
  pub stop_loss:     f64,
  pub take_profit_1: f64,
  pub take_profit_2: f64,
  pub risk_reward:   f64,
  pub confidence:    Ratio,
  /// Momentum (RSI) at the latest candle
  pub momentum:      f64,
  /// e.g. "Above EMA200"
  pub trend_label:   String,
}

/// Symbol excluded because its provider or data failed
#[derive(Debug, Clone)]
pub struct SymbolFailure {
  pub symbol: String,
  pub error:  ScreenerError,
}

impl serde::Serialize for SymbolFailure {
  fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut st = s.serialize_struct("SymbolFailure", 2)?;
    st.serialize_field("symbol", &self.symbol)?;
    st.serialize_field("error", &self.error.to_string())?;
    st.end()
  }
}

/// Aggregate statistics for one screening pass.
///
/// Signal counts and means cover every accepted candidate, before truncation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScreeningStats {
  pub symbols_total:     usize,
  pub symbols_screened:  usize,
  /// Insufficient history
  pub symbols_skipped:   usize,
  pub symbols_failed:    usize,
  pub symbols_cancelled: usize,
  pub bullish_count:     usize,
  pub bearish_count:     usize,
  /// `None` when no candidate was accepted
  pub mean_risk_reward:  Option<f64>,
  pub mean_confidence:   Option<f64>,
}

impl ScreeningStats {
  pub fn signal_count(&self) -> usize {
    self.bullish_count + self.bearish_count
  }
}

/// Output of one screening pass
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ScreeningResult {
  /// Bullish candidates, best first
  pub bullish:   Vec<TradeCandidate>,
  /// Bearish candidates, best first
  pub bearish:   Vec<TradeCandidate>,
  pub stats:     ScreeningStats,
  pub failures:  Vec<SymbolFailure>,
  /// True when the pass stopped early
  pub cancelled: bool,
}

impl ScreeningResult {
  pub fn is_empty(&self) -> bool {
    self.bullish.is_empty() && self.bearish.is_empty()
  }

  pub fn side(&self, direction: Direction) -> &[TradeCandidate] {
    match direction {
      Direction::Bullish => &self.bullish,
      Direction::Bearish => &self.bearish,
    }
  }
}

/// Outcome of evaluating one symbol
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
  /// Too little history; contributes nothing
  Skipped { need: usize, got: usize },
  /// Zero, one or two accepted candidates
  Screened(Vec<TradeCandidate>),
}

enum Outcome {
  Done(Evaluation),
  Failed(SymbolFailure),
  Cancelled,
}

// ============================================================
// SCREENER
// ============================================================

/// Fair value gap screener
#[derive(Debug, Clone)]
pub struct Screener {
  config:   ScreenerConfig,
  detector: FairValueGapDetector,
  planner:  TradePlanner,
  scorer:   ConfidenceScorer,
}

impl Screener {
  /// Screener with default planner and scorer
  pub fn new(config: ScreenerConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      detector: FairValueGapDetector::new(config.calibration_window, config.adaptive_threshold),
      planner: TradePlanner::default(),
      scorer: ConfidenceScorer::default(),
      config,
    })
  }

  pub fn with_defaults() -> Self {
    let config = ScreenerConfig::default();
    Self {
      detector: FairValueGapDetector::new(config.calibration_window, config.adaptive_threshold),
      planner: TradePlanner::default(),
      scorer: ConfidenceScorer::default(),
      config,
    }
  }

  pub fn config(&self) -> &ScreenerConfig {
    &self.config
  }

  pub fn detector(&self) -> &FairValueGapDetector {
    &self.detector
  }

  #[inline]
  pub fn min_candles(&self) -> usize {
    self.config.min_candles()
  }

  // ===========================================
  // Single symbol
  // ===========================================

  /// Evaluate one symbol's history.
  ///
  /// Errors only on malformed candles (when validation is enabled).
  pub fn evaluate<T: Ohlc>(&self, symbol: &str, candles: &[T]) -> Result<Evaluation> {
    let need = self.min_candles();
    if candles.len() < need {
      tracing::debug!(symbol, need, got = candles.len(), "skipping symbol with insufficient history");
      return Ok(Evaluation::Skipped { need, got: candles.len() });
    }
    if self.config.validate_data {
      validate_candles(candles)?;
    }

    let series = IndicatorSeries::compute(
      candles,
      self.config.trend_period,
      self.config.momentum_period,
      self.config.volatility_period,
    )?;
    let latest = series.latest();
    // Non-empty: checked against min_candles above
    let price = candles[candles.len() - 1].close();

    let detection = self.detector.detect(candles);
    let candidates = detection
      .iter()
      .filter_map(|gap| self.candidate(symbol, gap, price, &latest))
      .collect();

    Ok(Evaluation::Screened(candidates))
  }

  fn candidate(&self, symbol: &str, gap: Gap, price: f64, latest: &LatestReadings) -> Option<TradeCandidate> {
    let direction = gap.direction;
    let trend = latest.trend?;
    let momentum = latest.momentum?;

    let confirmed = match direction {
      Direction::Bullish => price > trend && momentum > 50.0,
      Direction::Bearish => price < trend && momentum < 50.0,
    };
    if !confirmed {
      return None;
    }

    let levels = self.planner.plan(direction, &gap, price, latest.volatility);
    if levels.risk_reward < self.config.min_risk_reward {
      return None;
    }

    let confidence = self.scorer.score(&ScoreInputs {
      direction,
      price,
      trend: latest.trend,
      momentum: latest.momentum,
      volatility: latest.volatility,
      gap,
    });
    if confidence.get() < self.config.min_confidence.get() {
      tracing::debug!(symbol, %direction, confidence = confidence.get(), "candidate below confidence gate");
      return None;
    }

    let position = if direction.is_bullish() { "Above" } else { "Below" };
    tracing::debug!(symbol, %direction, confidence = confidence.get(), "candidate accepted");

    Some(TradeCandidate {
      symbol: symbol.to_string(),
      direction,
      price,
      gap_low: gap.low,
      gap_high: gap.high,
      entry: levels.entry,
      stop_loss: levels.stop_loss,
      take_profit_1: levels.take_profit_1,
      take_profit_2: levels.take_profit_2,
      risk_reward: levels.risk_reward,
      confidence,
      momentum,
      trend_label: format!("{position} EMA{}", self.config.trend_period.get()),
    })
  }

  fn outcome<T: Ohlc>(&self, symbol: &str, candles: Result<impl AsRef<[T]>>) -> Outcome {
    match candles.and_then(|c| self.evaluate(symbol, c.as_ref())) {
      Ok(evaluation) => Outcome::Done(evaluation),
      Err(error) => {
        tracing::warn!(symbol, %error, "symbol excluded from screen");
        Outcome::Failed(SymbolFailure { symbol: symbol.to_string(), error })
      },
    }
  }

  // ===========================================
  // Batch
  // ===========================================

  /// Screen in-memory `(symbol, candles)` pairs in parallel.
  pub fn screen<'a, T, I>(&self, instruments: I) -> ScreeningResult
  where
    T: Ohlc + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
  {
    let outcomes: Vec<(String, Outcome)> = instruments
      .into_par_iter()
      .map(|(symbol, candles)| (symbol.to_string(), self.outcome::<T>(symbol, Ok(candles))))
      .collect();
    self.aggregate(outcomes)
  }

  /// Screen every symbol the provider lists.
  ///
  /// Fails only when the symbol list itself cannot be loaded; per-symbol
  /// failures are recorded in [`ScreeningResult::failures`].
  pub fn screen_universe<P: UniverseProvider>(&self, provider: &P) -> Result<ScreeningResult> {
    self.screen_universe_until(provider, &AtomicBool::new(false))
  }

  /// Like [`Screener::screen_universe`], but stops launching new symbol
  /// evaluations once `cancel` is set and returns what was already computed.
  pub fn screen_universe_until<P: UniverseProvider>(
    &self,
    provider: &P,
    cancel: &AtomicBool,
  ) -> Result<ScreeningResult> {
    let symbols = provider.symbols()?;
    tracing::info!(symbols = symbols.len(), "screening universe");

    let outcomes: Vec<(String, Outcome)> = symbols
      .into_par_iter()
      .map(|symbol| {
        if cancel.load(Ordering::Relaxed) {
          return (symbol, Outcome::Cancelled);
        }
        let outcome = self.outcome::<P::Candle>(&symbol, provider.candles(&symbol));
        (symbol, outcome)
      })
      .collect();

    Ok(self.aggregate(outcomes))
  }

  fn aggregate(&self, outcomes: Vec<(String, Outcome)>) -> ScreeningResult {
    let mut stats = ScreeningStats { symbols_total: outcomes.len(), ..Default::default() };
    let mut bullish = Vec::new();
    let mut bearish = Vec::new();
    let mut failures = Vec::new();

    for (_, outcome) in outcomes {
      match outcome {
        Outcome::Done(Evaluation::Skipped { .. }) => stats.symbols_skipped += 1,
        Outcome::Done(Evaluation::Screened(candidates)) => {
          stats.symbols_screened += 1;
          for c in candidates {
            match c.direction {
              Direction::Bullish => bullish.push(c),
              Direction::Bearish => bearish.push(c),
            }
          }
        },
        Outcome::Failed(f) => {
          stats.symbols_failed += 1;
          failures.push(f);
        },
        Outcome::Cancelled => stats.symbols_cancelled += 1,
      }
    }

    stats.bullish_count = bullish.len();
    stats.bearish_count = bearish.len();
    let accepted = bullish.len() + bearish.len();
    if accepted > 0 {
      let n = accepted as f64;
      let all = || bullish.iter().chain(bearish.iter());
      stats.mean_risk_reward = Some(all().map(|c| c.risk_reward).sum::<f64>() / n);
      stats.mean_confidence = Some(all().map(|c| c.confidence.get()).sum::<f64>() / n);
    }

    rank(&mut bullish, self.config.max_per_side);
    rank(&mut bearish, self.config.max_per_side);

    // Only symbols that never started make a run partial
    let cancelled = stats.symbols_cancelled > 0;

    tracing::info!(
      total = stats.symbols_total,
      screened = stats.symbols_screened,
      skipped = stats.symbols_skipped,
      failed = stats.symbols_failed,
      bullish = stats.bullish_count,
      bearish = stats.bearish_count,
      cancelled,
      "screen complete"
    );

    ScreeningResult { bullish, bearish, stats, failures, cancelled }
  }
}

/// Ranking precision; keys differing only below it tie
const RANK_DECIMALS: i32 = 2;

#[inline]
fn rank_key(value: f64) -> f64 {
  let scale = 10f64.powi(RANK_DECIMALS);
  (value * scale).round() / scale
}

/// Sort by `(confidence, risk_reward)` rounded to two decimals, descending,
/// ties by symbol, then truncate.
fn rank(candidates: &mut Vec<TradeCandidate>, max: usize) {
  candidates.sort_by(|a, b| {
    rank_key(b.confidence.get())
      .total_cmp(&rank_key(a.confidence.get()))
      .then(rank_key(b.risk_reward).total_cmp(&rank_key(a.risk_reward)))
      .then_with(|| a.symbol.cmp(&b.symbol))
  });
  candidates.truncate(max);
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`Screener`] instances
#[derive(Debug, Clone)]
pub struct ScreenerBuilder {
  trend_period:       usize,
  momentum_period:    usize,
  volatility_period:  usize,
  calibration_window: usize,
  adaptive_threshold: bool,
  min_confidence:     f64,
  min_risk_reward:    f64,
  max_per_side:       usize,
  validate_data:      bool,
  planner:            TradePlanner,
  scorer:             ConfidenceScorer,
}

impl Default for ScreenerBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl ScreenerBuilder {
  pub fn new() -> Self {
    Self::from_config(&ScreenerConfig::default())
  }

  /// Start from an existing configuration
  pub fn from_config(config: &ScreenerConfig) -> Self {
    Self {
      trend_period:       config.trend_period.get(),
      momentum_period:    config.momentum_period.get(),
      volatility_period:  config.volatility_period.get(),
      calibration_window: config.calibration_window.get(),
      adaptive_threshold: config.adaptive_threshold,
      min_confidence:     config.min_confidence.get(),
      min_risk_reward:    config.min_risk_reward,
      max_per_side:       config.max_per_side,
      validate_data:      config.validate_data,
      planner:            TradePlanner::default(),
      scorer:             ConfidenceScorer::default(),
    }
  }

  pub fn trend_period(mut self, period: usize) -> Self {
    self.trend_period = period;
    self
  }

  pub fn momentum_period(mut self, period: usize) -> Self {
    self.momentum_period = period;
    self
  }

  pub fn volatility_period(mut self, period: usize) -> Self {
    self.volatility_period = period;
    self
  }

  pub fn calibration_window(mut self, window: usize) -> Self {
    self.calibration_window = window;
    self
  }

  /// Enable/disable the adaptive gap threshold (disabled uses 0)
  pub fn adaptive_threshold(mut self, enable: bool) -> Self {
    self.adaptive_threshold = enable;
    self
  }

  pub fn min_confidence(mut self, confidence: f64) -> Self {
    self.min_confidence = confidence;
    self
  }

  pub fn min_risk_reward(mut self, risk_reward: f64) -> Self {
    self.min_risk_reward = risk_reward;
    self
  }

  pub fn max_per_side(mut self, max: usize) -> Self {
    self.max_per_side = max;
    self
  }

  /// Enable/disable candle validation
  pub fn validate_data(mut self, enable: bool) -> Self {
    self.validate_data = enable;
    self
  }

  /// Replace the trade level calculator
  pub fn planner(mut self, planner: TradePlanner) -> Self {
    self.planner = planner;
    self
  }

  /// Replace the confidence scorer
  pub fn scorer(mut self, scorer: ConfidenceScorer) -> Self {
    self.scorer = scorer;
    self
  }

  /// Validated configuration without building a screener
  pub fn config(&self) -> Result<ScreenerConfig> {
    let config = ScreenerConfig {
      trend_period:       Period::new(self.trend_period)?,
      momentum_period:    Period::new(self.momentum_period)?,
      volatility_period:  Period::new(self.volatility_period)?,
      calibration_window: Period::new(self.calibration_window)?,
      adaptive_threshold: self.adaptive_threshold,
      min_confidence:     Ratio::new(self.min_confidence)?,
      min_risk_reward:    self.min_risk_reward,
      max_per_side:       self.max_per_side,
      validate_data:      self.validate_data,
    };
    config.validate()?;
    Ok(config)
  }

  /// Build the screener
  pub fn build(self) -> Result<Screener> {
    let config = self.config()?;
    Ok(Screener {
      detector: FairValueGapDetector::new(config.calibration_window, config.adaptive_threshold),
      planner: self.planner,
      scorer: self.scorer,
      config,
    })
  }
}

// ============================================================
// TESTS
// ============================================================
