//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

/// Trailing mean of `values` over `period` points.
///
/// NaN for the first `period - 1` points and for any window that contains NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    // Initial window sum
    let mut sum = 0.0;
    let mut nan_in_window = false;
    for &v in values.iter().take(period) {
        if v.is_nan() {
            nan_in_window = true;
        }
        sum += v;
    }

    if !nan_in_window {
        result[period - 1] = sum / period as f64;
    }

    // Roll the window forward
    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        sum = sum - leaving + entering;

        // NaN poisons the running sum; rescan the window to recover.
        if entering.is_nan() || leaving.is_nan() || nan_in_window {
            nan_in_window = false;
            sum = 0.0;
            for &v in &values[(i + 1 - period)..=i] {
                if v.is_nan() {
                    nan_in_window = true;
                }
                sum += v;
            }
            if nan_in_window {
                continue;
            }
        }

        result[i] = sum / period as f64;
    }

    result
}
