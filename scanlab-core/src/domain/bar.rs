//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// Bars carry no symbol; they live inside a [`PriceSeries`](super::PriceSeries)
/// which owns the symbol and the date ordering invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Close × volume for this bar.
    pub fn traded_value(&self) -> f64 {
        self.close * self.volume as f64
    }
}
