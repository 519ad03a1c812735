//! Score record: the per-symbol output of one evaluation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::setup::Setup;

/// Scores and the indicator snapshot behind them, for the last bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,

    pub trend_score: u32,
    pub pattern_score: u32,
    pub volume_score: u32,
    /// `None` when no investor-flow snapshot was supplied.
    pub supply_score: Option<u32>,
    pub risk_score: u32,
    pub liquidity_score: u32,
    pub total_score: u32,

    pub stop: f64,
    /// Distance from close to stop, percent of close.
    pub risk_pct: f64,
    pub setup: Setup,

    pub vol_ratio: f64,
    pub adx: f64,
    pub bandwidth_rank: f64,
    pub ma20: f64,
    pub ma50: f64,
    pub ma200: f64,
    pub bb_upper: f64,
    pub bb_mid: f64,
    pub bb_lower: f64,
    pub memory_price: f64,
    pub avg_traded_value: f64,
    /// Names of the setup flags that fired on the last bar.
    pub tags: Vec<String>,
}

impl ScoreRecord {
    /// Sum of the sub-scores. Supply counts as zero when absent.
    pub fn sum_of_parts(&self) -> u32 {
        self.trend_score
            + self.pattern_score
            + self.volume_score
            + self.supply_score.unwrap_or(0)
            + self.risk_score
            + self.liquidity_score
    }
}
