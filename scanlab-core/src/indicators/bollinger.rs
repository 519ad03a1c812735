//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: mean(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

/// The three band series, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Compute all three bands in one pass over each window.
pub fn bollinger_bands(close: &[f64], length: usize, k: f64) -> BollingerBands {
    let n = close.len();
    let mut bands = BollingerBands {
        mid: vec![f64::NAN; n],
        upper: vec![f64::NAN; n],
        lower: vec![f64::NAN; n],
    };

    if length == 0 || n < length {
        return bands;
    }

    for i in (length - 1)..n {
        let window = &close[i + 1 - length..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }

        let mean = window.iter().sum::<f64>() / length as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / length as f64;
        let stddev = variance.sqrt();

        bands.mid[i] = mean;
        bands.upper[i] = mean + k * stddev;
        bands.lower[i] = mean - k * stddev;
    }

    bands
}

/// Relative band width: (upper - lower) / mid.
///
/// A zero or undefined middle band yields NaN, never zero, so that later
/// threshold tests on the value evaluate false.
pub fn bandwidth(mid: &[f64], upper: &[f64], lower: &[f64]) -> Vec<f64> {
    mid.iter()
        .zip(upper)
        .zip(lower)
        .map(|((&m, &u), &l)| {
            if m.is_nan() || m == 0.0 {
                f64::NAN
            } else {
                (u - l) / m
            }
        })
        .collect()
}
