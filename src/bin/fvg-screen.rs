//! Command-line screener
//!
//! Loads candle histories from a JSON file, screens them, prints the text report
//! and optionally writes a run snapshot.
//!
//! The input is an object mapping symbol to candles. Each candle is either an
//! object (`{"openTime", "open", "high", "low", "close"}`) or an exchange kline
//! row (`[openTime, "open", "high", "low", "close", ...]`).

use std::{
  collections::BTreeMap,
  fs,
  path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use fvg_screener::prelude::*;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// JSON file with candle histories keyed by symbol
  #[arg(long)]
  candles: PathBuf,

  /// Screen only this symbol
  #[arg(long)]
  symbol: Option<String>,

  /// JSON screener configuration; flags below override it
  #[arg(long)]
  config: Option<PathBuf>,

  #[arg(long)]
  trend_period: Option<usize>,

  #[arg(long)]
  momentum_period: Option<usize>,

  #[arg(long)]
  volatility_period: Option<usize>,

  #[arg(long)]
  calibration_window: Option<usize>,

  /// Use a fixed gap threshold of 0 instead of the adaptive one
  #[arg(long, default_value_t = false)]
  fixed_threshold: bool,

  #[arg(long)]
  min_confidence: Option<f64>,

  #[arg(long)]
  min_risk_reward: Option<f64>,

  #[arg(long)]
  max_per_side: Option<usize>,

  /// Candle interval label recorded in the snapshot
  #[arg(long, default_value = "4h")]
  interval: String,

  /// Write a JSON snapshot of the run into this directory
  #[arg(long)]
  snapshot_dir: Option<PathBuf>,
}

// Initialise an INFO `Subscriber` for `Tracing` logs and install it as the global default.
fn init_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .compact()
    .init()
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum CandleRow {
  Object(Candle),
  Kline(Vec<serde_json::Value>),
}

fn kline_number(value: &serde_json::Value, field: &str) -> Result<f64> {
  match value {
    serde_json::Value::Number(n) => n.as_f64().with_context(|| format!("{field} out of range")),
    serde_json::Value::String(s) => s.parse::<f64>().with_context(|| format!("{field} is not a number: {s}")),
    other => bail!("{field} has unexpected type: {other}"),
  }
}

impl CandleRow {
  fn into_candle(self) -> Result<Candle> {
    match self {
      CandleRow::Object(c) => Ok(c),
      CandleRow::Kline(row) => {
        if row.len() < 5 {
          bail!("kline row has {} fields, need at least 5", row.len());
        }
        let open_time = row[0].as_i64().context("openTime is not an integer")?;
        Ok(Candle::new(
          open_time,
          kline_number(&row[1], "open")?,
          kline_number(&row[2], "high")?,
          kline_number(&row[3], "low")?,
          kline_number(&row[4], "close")?,
        ))
      },
    }
  }
}

fn parse_universe(raw: &str) -> Result<InMemoryUniverse> {
  let rows: BTreeMap<String, Vec<CandleRow>> = serde_json::from_str(raw).context("parsing candle file")?;
  let mut universe = InMemoryUniverse::new();
  for (symbol, rows) in rows {
    let candles = rows
      .into_iter()
      .map(CandleRow::into_candle)
      .collect::<Result<Vec<_>>>()
      .with_context(|| format!("parsing candles for {symbol}"))?;
    universe.insert(symbol, candles);
  }
  Ok(universe)
}

fn build_screener(cli: &Cli) -> Result<Screener> {
  let base = match &cli.config {
    Some(path) => {
      let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
      serde_json::from_str::<ScreenerConfig>(&raw).with_context(|| format!("parsing {}", path.display()))?
    },
    None => ScreenerConfig::default(),
  };

  let mut builder = ScreenerBuilder::from_config(&base);
  if let Some(v) = cli.trend_period {
    builder = builder.trend_period(v);
  }
  if let Some(v) = cli.momentum_period {
    builder = builder.momentum_period(v);
  }
  if let Some(v) = cli.volatility_period {
    builder = builder.volatility_period(v);
  }
  if let Some(v) = cli.calibration_window {
    builder = builder.calibration_window(v);
  }
  if cli.fixed_threshold {
    builder = builder.adaptive_threshold(false);
  }
  if let Some(v) = cli.min_confidence {
    builder = builder.min_confidence(v);
  }
  if let Some(v) = cli.min_risk_reward {
    builder = builder.min_risk_reward(v);
  }
  if let Some(v) = cli.max_per_side {
    builder = builder.max_per_side(v);
  }
  Ok(builder.build()?)
}

fn write_snapshot(dir: &Path, snapshot: &RunSnapshot, file_stem: &str) -> Result<PathBuf> {
  fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
  let path = dir.join(format!("{file_stem}.json"));
  fs::write(&path, snapshot.to_json_pretty()?).with_context(|| format!("writing {}", path.display()))?;
  Ok(path)
}

fn main() -> Result<()> {
  init_logging();
  let cli = Cli::parse();

  let screener = build_screener(&cli)?;
  let raw = fs::read_to_string(&cli.candles).with_context(|| format!("reading {}", cli.candles.display()))?;
  let universe = parse_universe(&raw)?;

  let result = match &cli.symbol {
    Some(symbol) => screener.screen_universe(&SingleSymbol::new(&universe, symbol.as_str()))?,
    None => screener.screen_universe(&universe)?,
  };

  let now = chrono::Local::now();
  let header = ReportHeader { timestamp: now.format("%Y-%m-%d %H:%M %Z").to_string(), ..Default::default() };
  println!("{}", render_report(&result, &header));

  if let Some(dir) = &cli.snapshot_dir {
    let snapshot = RunSnapshot::new(&result, screener.config(), header.timestamp.clone(), cli.interval.clone());
    match write_snapshot(dir, &snapshot, &now.format("%Y%m%d_%H%M").to_string()) {
      Ok(path) => tracing::info!(path = %path.display(), "snapshot written"),
      // A failed audit write does not invalidate the run
      Err(error) => tracing::warn!(%error, "could not write snapshot"),
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_objects_and_klines() {
    let raw = r#"{
      "BTCUSDT": [[1700000000000, "100.0", "101.5", "99.5", "101.0", "123.4"]],
      "ETHUSDT": [{"openTime": 1700000000000, "open": 10, "high": 11, "low": 9, "close": 10.5}]
    }"#;
    let universe = parse_universe(raw).unwrap();
    assert_eq!(universe.len(), 2);
    assert_eq!(universe.get("BTCUSDT").unwrap()[0], Candle::new(1700000000000, 100.0, 101.5, 99.5, 101.0));
    assert_eq!(universe.get("ETHUSDT").unwrap()[0].close, 10.5);
  }

  #[test]
  fn test_short_kline_row_rejected() {
    assert!(parse_universe(r#"{"BTCUSDT": [[1, "1", "2"]]}"#).is_err());
  }

  #[test]
  fn test_cli_overrides() {
    let cli = Cli::parse_from(["fvg-screen", "--candles", "x.json", "--trend-period", "50", "--fixed-threshold"]);
    let screener = build_screener(&cli).unwrap();
    assert_eq!(screener.config().trend_period.get(), 50);
    assert!(!screener.config().adaptive_threshold);
  }
}
