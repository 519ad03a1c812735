//! Rank-by-count percentile over a trailing window.
//!
//! rank[t] = (#{ v in window : v <= x[t] } - 1) / (window - 1) * 100
//!
//! The window is the `window` values ending at t (inclusive). Ties are not
//! averaged: a run of equal values all rank at the top of their tie group.
//! Lookback: window - 1.

/// Percentile rank of each point within its trailing window, in [0, 100].
///
/// NaN while the window is not yet full, when the current value is NaN, or
/// when any value in the window is NaN. `window < 2` yields all NaN.
pub fn percentile_rank(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];

    if window < 2 || n < window {
        return result;
    }

    let denom = (window - 1) as f64;
    for i in (window - 1)..n {
        let slice = &series[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let current = series[i];
        let at_or_below = slice.iter().filter(|&&v| v <= current).count();
        result[i] = (at_or_below - 1) as f64 / denom * 100.0;
    }

    result
}

/// Trailing minimum over `window` points (NaN if the window is short or holds NaN).
pub fn rolling_min(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];

    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &series[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().copied().fold(f64::INFINITY, f64::min);
    }

    result
}
