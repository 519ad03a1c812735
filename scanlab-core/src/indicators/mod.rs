//! Indicator library: pure rolling-window math over price/volume series.
//!
//! Free functions operate on `&[f64]` columns and return series aligned with
//! their input, using `f64::NAN` for undefined points.

pub mod adx;
pub mod bollinger;
pub mod percentile;
pub mod sma;
pub mod volume;

pub use adx::{average_directional_index, directional_movement, true_range};
pub use bollinger::{bandwidth, bollinger_bands, BollingerBands};
pub use percentile::{percentile_rank, rolling_min};
pub use sma::rolling_mean;
pub use volume::{climax_bars, volume_ratio, ClimaxLevels, VOLUME_AVG_PERIOD};

/// Create bars from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
