//! Instrument universe providers
//!
//! The screener never fetches data itself. It asks a [`UniverseProvider`] for the
//! symbol list and for each symbol's candle history. Debug runs over one symbol
//! wrap any provider in [`SingleSymbol`] instead of altering the provider.

use std::collections::BTreeMap;

use crate::{Candle, Ohlc, Result, ScreenerError};

// ============================================================
// PROVIDER TRAIT
// ============================================================

/// Source of symbols and their candle histories
pub trait UniverseProvider: Send + Sync {
  type Candle: Ohlc + Send + Sync;

  /// Symbols to screen, in a stable order
  fn symbols(&self) -> Result<Vec<String>>;

  /// Time-ordered candle history for `symbol`
  fn candles(&self, symbol: &str) -> Result<Vec<Self::Candle>>;
}

impl<P: UniverseProvider> UniverseProvider for &P {
  type Candle = P::Candle;

  fn symbols(&self) -> Result<Vec<String>> {
    (**self).symbols()
  }

  fn candles(&self, symbol: &str) -> Result<Vec<Self::Candle>> {
    (**self).candles(symbol)
  }
}

// ============================================================
// IN-MEMORY UNIVERSE
// ============================================================

/// Candle histories held in memory, keyed by symbol (sorted)
#[derive(Debug, Clone)]
pub struct InMemoryUniverse<T = Candle> {
  histories: BTreeMap<String, Vec<T>>,
}

impl<T> Default for InMemoryUniverse<T> {
  fn default() -> Self {
    Self { histories: BTreeMap::new() }
  }
}

impl<T> InMemoryUniverse<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or replace a symbol's history
  pub fn insert(&mut self, symbol: impl Into<String>, candles: Vec<T>) -> &mut Self {
    self.histories.insert(symbol.into(), candles);
    self
  }

  pub fn get(&self, symbol: &str) -> Option<&[T]> {
    self.histories.get(symbol).map(Vec::as_slice)
  }

  pub fn len(&self) -> usize {
    self.histories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.histories.is_empty()
  }

  /// Borrowed `(symbol, candles)` pairs in symbol order
  pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
    self.histories.iter().map(|(s, c)| (s.as_str(), c.as_slice()))
  }
}

impl<T, S: Into<String>> FromIterator<(S, Vec<T>)> for InMemoryUniverse<T> {
  fn from_iter<I: IntoIterator<Item = (S, Vec<T>)>>(iter: I) -> Self {
    Self { histories: iter.into_iter().map(|(s, c)| (s.into(), c)).collect() }
  }
}

impl<T: Ohlc + Clone + Send + Sync> UniverseProvider for InMemoryUniverse<T> {
  type Candle = T;

  fn symbols(&self) -> Result<Vec<String>> {
    Ok(self.histories.keys().cloned().collect())
  }

  fn candles(&self, symbol: &str) -> Result<Vec<T>> {
    self.histories.get(symbol).cloned().ok_or_else(|| ScreenerError::Provider {
      symbol: symbol.to_string(),
      reason: "unknown symbol".to_string(),
    })
  }
}

// ============================================================
// SINGLE SYMBOL
// ============================================================

/// Restricts another provider to one symbol
#[derive(Debug, Clone)]
pub struct SingleSymbol<P> {
  inner:  P,
  symbol: String,
}

impl<P: UniverseProvider> SingleSymbol<P> {
  /// Symbols are matched upper-cased, as exchange tickers are
  pub fn new(inner: P, symbol: impl Into<String>) -> Self {
    Self { inner, symbol: symbol.into().trim().to_uppercase() }
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }
}

impl<P: UniverseProvider> UniverseProvider for SingleSymbol<P> {
  type Candle = P::Candle;

  fn symbols(&self) -> Result<Vec<String>> {
    Ok(vec![self.symbol.clone()])
  }

  fn candles(&self, symbol: &str) -> Result<Vec<Self::Candle>> {
    self.inner.candles(symbol)
  }
}

// ============================================================
// TESTS
// ============================================================
