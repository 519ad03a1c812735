//! Price/volume series for a single symbol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Bar;

/// Errors raised when constructing a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("bar {index} is not strictly after the previous bar ({date})")]
    OutOfOrder { index: usize, date: chrono::NaiveDate },
}

/// Ordered daily bars for one symbol.
///
/// Invariant: dates are strictly increasing (no duplicates). Gaps for
/// non-trading days are allowed. An empty series is valid; it simply never
/// passes the warm-up check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
    /// Market capitalization, when the caller knows it. Used by the turnover gate.
    market_cap: Option<f64>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
            market_cap: None,
        })
    }

    /// Build a series from bars in any order. Sorts by date; on duplicate
    /// dates the bar appearing last in the input wins.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        // Stable sort keeps input order among equal dates, so the last one is the latest.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
            market_cap: None,
        }
    }

    pub fn with_market_cap(mut self, market_cap: Option<f64>) -> Self {
        self.market_cap = market_cap;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Volumes as f64 for rolling-window math.
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}
