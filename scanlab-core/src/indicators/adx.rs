//! ADX — Average Directional Index with simple-mean smoothing.
//!
//! Steps:
//! 1. +DM and -DM from consecutive bars (only the larger positive move counts)
//! 2. Trailing n-bar mean of TR, +DM and -DM
//! 3. +DI = 100 * mean(+DM) / mean(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = trailing n-bar mean of DX
//!
//! The smoothing is a plain rolling mean, not Wilder's recursive average.
//! Lookback: 2 * (period - 1).

use super::sma::rolling_mean;

/// True Range series.
///
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    tr[0] = high[0] - low[0];

    for i in 1..n {
        let h = high[i];
        let l = low[i];
        let pc = close[i - 1];
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            tr[i] = f64::NAN;
        } else {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Directional movement series (+DM, -DM). The first bar has no prior bar and gets 0.
pub fn directional_movement(high: &[f64], low: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = high.len().min(low.len());
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];

    for i in 1..n {
        if high[i].is_nan() || low[i].is_nan() || high[i - 1].is_nan() || low[i - 1].is_nan() {
            plus_dm[i] = f64::NAN;
            minus_dm[i] = f64::NAN;
            continue;
        }

        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];

        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    (plus_dm, minus_dm)
}

/// ADX over `period` bars. Values lie in [0, 100]; NaN during warm-up and
/// wherever the average true range or the DI sum is zero.
pub fn average_directional_index(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    if period == 0 || n == 0 {
        return vec![f64::NAN; n];
    }

    let tr = true_range(high, low, close);
    let (plus_dm, minus_dm) = directional_movement(high, low);

    let atr = rolling_mean(&tr, period);
    let mean_plus_dm = rolling_mean(&plus_dm, period);
    let mean_minus_dm = rolling_mean(&minus_dm, period);

    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if atr[i].is_nan() || atr[i] == 0.0 {
            continue;
        }

        let plus_di = 100.0 * mean_plus_dm[i] / atr[i];
        let minus_di = 100.0 * mean_minus_dm[i] / atr[i];
        let di_sum = plus_di + minus_di;

        // NaN DI propagates; a zero sum means no directional movement at all.
        if di_sum.is_nan() || di_sum == 0.0 {
            continue;
        }
        dx[i] = 100.0 * (plus_di - minus_di).abs() / di_sum;
    }

    rolling_mean(&dx, period)
}
