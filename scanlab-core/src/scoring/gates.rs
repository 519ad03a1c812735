//! Hard gates: liquidity/turnover and stop-loss risk.
//!
//! A gate either passes with the value it measured or rejects the symbol.
//! NaN inputs never pass.

use crate::config::ScanConfig;
use crate::domain::Bar;

use super::Rejection;

/// Measured liquidity of a series that passed the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Liquidity {
    pub avg_traded_value: f64,
    /// Average traded value as a percent of market cap, when the cap is known.
    pub turnover_pct: Option<f64>,
    pub score: u32,
}

/// Mean close × volume over the last `window` bars (fewer if the series is shorter).
pub fn avg_traded_value(bars: &[Bar], window: usize) -> f64 {
    let start = bars.len().saturating_sub(window);
    let recent = &bars[start..];
    if recent.is_empty() {
        return f64::NAN;
    }
    recent.iter().map(Bar::traded_value).sum::<f64>() / recent.len() as f64
}

/// Reject illiquid symbols; otherwise score the traded value tier.
pub fn liquidity_gate(
    bars: &[Bar],
    market_cap: Option<f64>,
    config: &ScanConfig,
) -> Result<Liquidity, Rejection> {
    let liq = &config.liquidity;
    let avg = avg_traded_value(bars, liq.window);

    if !(avg >= liq.min_avg_traded_value) {
        return Err(Rejection::Liquidity {
            avg_traded_value: avg,
            floor: liq.min_avg_traded_value,
        });
    }

    let turnover_pct = match market_cap {
        Some(cap) if cap > 0.0 => {
            let pct = avg / cap * 100.0;
            if pct < liq.min_turnover_pct {
                return Err(Rejection::Turnover {
                    turnover_pct: pct,
                    floor: liq.min_turnover_pct,
                });
            }
            Some(pct)
        }
        _ => None,
    };

    let cap = config.scoring.liquidity;
    let score = if avg >= liq.strong_traded_value {
        cap
    } else if avg >= liq.moderate_traded_value {
        3.min(cap)
    } else {
        1.min(cap)
    };

    Ok(Liquidity {
        avg_traded_value: avg,
        turnover_pct,
        score,
    })
}

/// Lowest low over the last `lookback` bars, today included.
pub fn trailing_low(bars: &[Bar], lookback: usize) -> f64 {
    let start = bars.len().saturating_sub(lookback);
    bars[start..]
        .iter()
        .map(|b| b.low)
        .fold(f64::NAN, f64::min)
}

/// Percent distance from close down to stop.
pub fn risk_pct(close: f64, stop: f64) -> f64 {
    (close - stop) / close * 100.0
}

/// Reject unusable stops and stops further away than the hard limit.
/// Returns the risk percent on success.
pub fn risk_gate(close: f64, stop: f64, config: &ScanConfig) -> Result<f64, Rejection> {
    if !(stop > 0.0 && close > stop) {
        return Err(Rejection::InvalidStop { stop, close });
    }
    let pct = risk_pct(close, stop);
    if !(pct <= config.risk.hard_stop_pct) {
        return Err(Rejection::RiskTooWide {
            risk_pct: pct,
            limit: config.risk.hard_stop_pct,
        });
    }
    Ok(pct)
}
