//! Volume indicators: relative volume and climax-bar memory levels.
//!
//! A climax bar is a bar whose volume is at least `mult` times its trailing
//! average volume (the average includes the bar itself). The high and low of
//! the most recent climax bar are carried forward until the next climax,
//! giving a supply/demand level that later bars can break through.

use super::sma::rolling_mean;

/// Default averaging window for volume ratios and climax detection.
pub const VOLUME_AVG_PERIOD: usize = 20;

/// volume[t] / mean(volume, period)[t]. NaN when the mean is zero or undefined.
pub fn volume_ratio(volume: &[f64], period: usize) -> Vec<f64> {
    let avg = rolling_mean(volume, period);
    volume
        .iter()
        .zip(&avg)
        .map(|(&v, &a)| if a.is_nan() || a == 0.0 { f64::NAN } else { v / a })
        .collect()
}

/// Climax flags plus forward-filled climax high/low, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimaxLevels {
    pub is_climax: Vec<bool>,
    /// High of the latest climax bar at or before t (NaN before the first one).
    pub high: Vec<f64>,
    /// Low of the latest climax bar at or before t (NaN before the first one).
    pub low: Vec<f64>,
}

/// Detect climax bars and forward-fill their high/low.
pub fn climax_bars(
    volume: &[f64],
    high: &[f64],
    low: &[f64],
    mult: f64,
    period: usize,
) -> ClimaxLevels {
    let n = volume.len().min(high.len()).min(low.len());
    let avg = rolling_mean(&volume[..n], period);

    let mut levels = ClimaxLevels {
        is_climax: vec![false; n],
        high: vec![f64::NAN; n],
        low: vec![f64::NAN; n],
    };

    let mut carried = (f64::NAN, f64::NAN);
    for i in 0..n {
        // NaN average compares false
        if volume[i] >= mult * avg[i] && avg[i] > 0.0 {
            levels.is_climax[i] = true;
            carried = (high[i], low[i]);
        }
        levels.high[i] = carried.0;
        levels.low[i] = carried.1;
    }

    levels
}
