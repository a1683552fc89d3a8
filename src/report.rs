//! Human-readable report and serializable run snapshot
//!
//! Delivery and persistence happen outside the library; this module only shapes
//! a [`ScreeningResult`] for them.

use crate::{
  screener::{ScreenerConfig, ScreeningResult, ScreeningStats, TradeCandidate},
  Direction,
};

// ============================================================
// TEXT REPORT
// ============================================================

/// Header lines of a text report
#[derive(Debug, Clone)]
pub struct ReportHeader {
  pub title:     String,
  /// Preformatted run time, e.g. "2024-05-01 09:02 IST"
  pub timestamp: String,
  pub market:    String,
}

impl Default for ReportHeader {
  fn default() -> Self {
    Self {
      title:     "Smart FVG Strategy - 4H Signal Report".to_string(),
      timestamp: String::new(),
      market:    "Binance USDT-M".to_string(),
    }
  }
}

const EMPTY_MEAN: &str = "—";

fn candidate_line(c: &TradeCandidate) -> String {
  format!(
    "{} | Entry {:.4} | SL {:.4} | TP1 {:.4} | TP2 {:.4} | RR {:.2} | Conf {:.2} | RSI {:.1} | {}",
    c.symbol,
    c.entry,
    c.stop_loss,
    c.take_profit_1,
    c.take_profit_2,
    c.risk_reward,
    c.confidence.get(),
    c.momentum,
    c.trend_label,
  )
}

fn side_section(header: &str, candidates: &[TradeCandidate]) -> String {
  if candidates.is_empty() {
    return format!("{header}: None");
  }
  let mut lines = vec![header.to_string()];
  lines.extend(candidates.iter().map(candidate_line));
  lines.join("\n")
}

/// `Signals: N | Avg RR: x.xx | Avg confidence: y.yy`, with "—" for empty means.
pub fn summary_line(stats: &ScreeningStats) -> String {
  let fmt_mean = |v: Option<f64>| v.map(|m| format!("{m:.2}")).unwrap_or_else(|| EMPTY_MEAN.to_string());
  format!(
    "Signals: {} | Avg RR: {} | Avg confidence: {}",
    stats.signal_count(),
    fmt_mean(stats.mean_risk_reward),
    fmt_mean(stats.mean_confidence),
  )
}

fn side_header(direction: Direction) -> &'static str {
  match direction {
    Direction::Bullish => "Bullish Trades",
    Direction::Bearish => "Bearish Trades",
  }
}

/// Render the full report text
pub fn render_report(result: &ScreeningResult, header: &ReportHeader) -> String {
  let mut lines = vec![header.title.clone()];
  if !header.timestamp.is_empty() {
    lines.push(format!("Time: {}", header.timestamp));
  }
  lines.push(format!("Market: {}", header.market));

  for direction in [Direction::Bullish, Direction::Bearish] {
    lines.push(String::new());
    lines.push(side_section(side_header(direction), result.side(direction)));
  }

  lines.push(String::new());
  lines.push(summary_line(&result.stats));
  if result.stats.symbols_failed > 0 {
    lines.push(format!("Skipped (errors): {}", result.stats.symbols_failed));
  }
  if result.cancelled {
    lines.push("Run cancelled: partial results".to_string());
  }

  let mut out = lines.join("\n");
  out.push('\n');
  out
}

// ============================================================
// SNAPSHOT
// ============================================================

/// Audit record of one screening run
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunSnapshot {
  pub timestamp:          String,
  pub interval:           String,
  pub adaptive_threshold: bool,
  pub min_confidence:     f64,
  pub config:             ScreenerConfig,
  pub bullish:            Vec<TradeCandidate>,
  pub bearish:            Vec<TradeCandidate>,
  pub stats:              ScreeningStats,
  pub failed_symbols:     Vec<String>,
  pub cancelled:          bool,
}

impl RunSnapshot {
  pub fn new(
    result: &ScreeningResult,
    config: &ScreenerConfig,
    timestamp: impl Into<String>,
    interval: impl Into<String>,
  ) -> Self {
    Self {
      timestamp:          timestamp.into(),
      interval:           interval.into(),
      adaptive_threshold: config.adaptive_threshold,
      min_confidence:     config.min_confidence.get(),
      config:             config.clone(),
      bullish:            result.bullish.clone(),
      bearish:            result.bearish.clone(),
      stats:              result.stats.clone(),
      failed_symbols:     result.failures.iter().map(|f| f.symbol.clone()).collect(),
      cancelled:          result.cancelled,
    }
  }

  pub fn to_json_pretty(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Ratio;

  fn candidate(symbol: &str) -> TradeCandidate {
    TradeCandidate {
      symbol:        symbol.to_string(),
      direction:     Direction::Bullish,
      price:         112.0,
      gap_low:       100.0,
      gap_high:      110.0,
      entry:         105.0,
      stop_loss:     99.0,
      take_profit_1: 114.0,
      take_profit_2: 120.0,
      risk_reward:   2.5,
      confidence:    Ratio::new_const(0.8123),
      momentum:      61.26,
      trend_label:   "Above EMA200".to_string(),
    }
  }

  #[test]
  fn test_empty_report() {
    let text = render_report(&ScreeningResult::default(), &ReportHeader::default());
    assert!(text.contains("Bullish Trades: None"));
    assert!(text.contains("Bearish Trades: None"));
    assert!(text.contains("Signals: 0 | Avg RR: — | Avg confidence: —"));
  }

  #[test]
  fn test_report_layout_with_failures_and_cancel() {
    let result = ScreeningResult {
      stats: ScreeningStats { symbols_failed: 2, symbols_cancelled: 1, ..Default::default() },
      cancelled: true,
      ..Default::default()
    };
    let header = ReportHeader { timestamp: "T".to_string(), ..Default::default() };
    assert_eq!(
      render_report(&result, &header),
      "Smart FVG Strategy - 4H Signal Report\nTime: T\nMarket: Binance USDT-M\n\n\
       Bullish Trades: None\n\nBearish Trades: None\n\n\
       Signals: 0 | Avg RR: — | Avg confidence: —\n\
       Skipped (errors): 2\nRun cancelled: partial results\n"
    );
  }

  #[test]
  fn test_bearish_candidates_listed_under_bearish_header() {
    let short = TradeCandidate { direction: Direction::Bearish, ..candidate("ETHUSDT") };
    let result = ScreeningResult { bearish: vec![short], ..Default::default() };
    let text = render_report(&result, &ReportHeader::default());
    assert!(text.contains("Bullish Trades: None\n\nBearish Trades\nETHUSDT | Entry"));
  }

  #[test]
  fn test_candidate_line_format() {
    assert_eq!(
      candidate_line(&candidate("BTCUSDT")),
      "BTCUSDT | Entry 105.0000 | SL 99.0000 | TP1 114.0000 | TP2 120.0000 | RR 2.50 | Conf 0.81 | RSI 61.3 | Above EMA200"
    );
  }

  #[test]
  fn test_report_with_candidates() {
    let result = ScreeningResult {
      bullish: vec![candidate("BTCUSDT")],
      stats: ScreeningStats {
        bullish_count: 1,
        mean_risk_reward: Some(2.5),
        mean_confidence: Some(0.8123),
        ..Default::default()
      },
      ..Default::default()
    };
    let header = ReportHeader { timestamp: "2024-05-01 09:02 IST".to_string(), ..Default::default() };
    let text = render_report(&result, &header);
    assert!(text.starts_with("Smart FVG Strategy - 4H Signal Report\nTime: 2024-05-01 09:02 IST\n"));
    assert!(text.contains("Bullish Trades\nBTCUSDT | Entry"));
    assert!(text.contains("Signals: 1 | Avg RR: 2.50 | Avg confidence: 0.81"));
  }

  #[test]
  fn test_snapshot_round_trip() {
    let result = ScreeningResult { bullish: vec![candidate("ETHUSDT")], ..Default::default() };
    let snapshot = RunSnapshot::new(&result, &ScreenerConfig::default(), "20240501_0902", "4h");
    let json = snapshot.to_json_pretty().unwrap();
    let back: RunSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert!(back.adaptive_threshold);
    assert_eq!(back.min_confidence, 0.6);
  }
}
