//! Scoring engine — combines gates and capped sub-scores into a [`ScoreRecord`].
//!
//! Evaluation is a pure function of the series, the configuration and the
//! optional supply snapshot. Everything is recomputed from raw bars on every
//! call; nothing is cached between symbols.

pub mod gates;
pub mod record;
pub mod subscores;

pub use gates::{avg_traded_value, liquidity_gate, risk_gate, trailing_low, Liquidity};
pub use record::ScoreRecord;
pub use subscores::{pattern_score, risk_score, supply_score, trend_score, volume_score};

use thiserror::Error;
use tracing::debug;

use crate::config::ScanConfig;
use crate::domain::{PriceSeries, SupplySnapshot};
use crate::frame::IndicatorFrame;
use crate::setup::{self, Setup};

/// Why a symbol produced no score. Never an error condition for a scan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("insufficient history: {bars} bars, {required} required")]
    InsufficientHistory { bars: usize, required: usize },
    #[error("last close {close} is not a positive price")]
    InvalidClose { close: f64 },
    #[error("average traded value {avg_traded_value:.0} below floor {floor:.0}")]
    Liquidity { avg_traded_value: f64, floor: f64 },
    #[error("turnover {turnover_pct:.4}% of market cap below {floor}%")]
    Turnover { turnover_pct: f64, floor: f64 },
    #[error("stop {stop} is unusable for close {close}")]
    InvalidStop { stop: f64, close: f64 },
    #[error("risk {risk_pct:.2}% exceeds hard stop {limit}%")]
    RiskTooWide { risk_pct: f64, limit: f64 },
}

/// Score the last bar of `series`. `None` when the symbol is not applicable;
/// the reason is logged at debug level.
pub fn evaluate(
    series: &PriceSeries,
    config: &ScanConfig,
    supply: Option<&SupplySnapshot>,
) -> Option<ScoreRecord> {
    match evaluate_detailed(series, config, supply) {
        Ok(record) => Some(record),
        Err(reason) => {
            debug!(symbol = series.symbol(), %reason, "not applicable");
            None
        }
    }
}

/// Like [`evaluate`], but reports why a symbol was rejected.
pub fn evaluate_detailed(
    series: &PriceSeries,
    config: &ScanConfig,
    supply: Option<&SupplySnapshot>,
) -> Result<ScoreRecord, Rejection> {
    let required = config.warmup_bars();
    let last = match series.last() {
        Some(bar) if series.len() >= required => *bar,
        _ => {
            return Err(Rejection::InsufficientHistory {
                bars: series.len(),
                required,
            })
        }
    };
    if !(last.close.is_finite() && last.close > 0.0) {
        return Err(Rejection::InvalidClose { close: last.close });
    }

    let liquidity = liquidity_gate(series.bars(), series.market_cap(), config)?;

    let frame = IndicatorFrame::compute(series, config);
    let t = frame.len() - 1;
    let Some(flags) = setup::detect(&frame, config, t) else {
        return Err(Rejection::InsufficientHistory {
            bars: series.len(),
            required,
        });
    };

    let stop = if flags.setup == Setup::ClimaxBreakout {
        flags.climax_low
    } else {
        trailing_low(series.bars(), config.risk.stop_lookback)
    };
    let risk_pct = risk_gate(last.close, stop, config)?;

    let trend = trend_score(&frame, t, config);
    let pattern = pattern_score(&flags, config);
    let volume = volume_score(&frame, t, config);
    let supply_points = supply_score(supply, config);
    let risk = risk_score(risk_pct, config);

    let total = trend + pattern + volume + supply_points.unwrap_or(0) + risk + liquidity.score;

    Ok(ScoreRecord {
        symbol: series.symbol().to_string(),
        date: last.date,
        close: last.close,
        trend_score: trend,
        pattern_score: pattern,
        volume_score: volume,
        supply_score: supply_points,
        risk_score: risk,
        liquidity_score: liquidity.score,
        total_score: total,
        stop,
        risk_pct,
        setup: flags.setup,
        vol_ratio: frame.volume_ratio[t],
        adx: frame.adx[t],
        bandwidth_rank: frame.bandwidth_rank[t],
        ma20: frame.ma_short[t],
        ma50: frame.ma_mid[t],
        ma200: frame.ma_long[t],
        bb_upper: frame.upper[t],
        bb_mid: frame.mid[t],
        bb_lower: frame.lower[t],
        memory_price: flags.memory_price,
        avg_traded_value: liquidity.avg_traded_value,
        tags: flags.tags().into_iter().map(String::from).collect(),
    })
}
