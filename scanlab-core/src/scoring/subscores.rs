//! Capped category sub-scores for the trend, pattern, volume, supply and risk factors.
//!
//! Each function scores bar `t` of a frame and never exceeds its cap.

use crate::config::{RunMode, ScanConfig};
use crate::domain::SupplySnapshot;
use crate::frame::IndicatorFrame;
use crate::setup::SetupFlags;

const MA_ABOVE_POINTS: u32 = 5;
const MA_STACKED_POINTS: u32 = 5;
const ADX_STRONG_POINTS: u32 = 5;
const ADX_MIN_POINTS: u32 = 3;

const PATTERN_POINTS: u32 = 10;

const CLIMAX_HISTORY_POINTS: i32 = 5;
const DRY_DAYS_POINTS: i32 = 7;
const RATIO_MODERATE_POINTS: i32 = 5;
const RATIO_STRONG_POINTS: i32 = 8;
const RATIO_OVERHEAT_POINTS: i32 = 3;
const RATIO_SPIKE_PENALTY: i32 = -3;

/// Close above each moving average, stacked averages, and ADX strength.
pub fn trend_score(frame: &IndicatorFrame, t: usize, config: &ScanConfig) -> u32 {
    let close = frame.close[t];
    let (short, mid, long) = (frame.ma_short[t], frame.ma_mid[t], frame.ma_long[t]);

    let mut points = [short, mid, long]
        .iter()
        .filter(|&&ma| close > ma)
        .count() as u32
        * MA_ABOVE_POINTS;

    if short > mid && mid > long {
        points += MA_STACKED_POINTS;
    }

    let adx = frame.adx[t];
    if adx >= config.trend.adx_strong {
        points += ADX_STRONG_POINTS;
    } else if adx >= config.trend.adx_min {
        points += ADX_MIN_POINTS;
    }

    points.min(config.scoring.trend)
}

/// Door-knock, squeeze and volume-memory proximity.
pub fn pattern_score(flags: &SetupFlags, config: &ScanConfig) -> u32 {
    let points = [flags.door_knock, flags.squeeze, flags.memory]
        .iter()
        .filter(|&&on| on)
        .count() as u32
        * PATTERN_POINTS;
    points.min(config.scoring.pattern)
}

/// Past climax, recent dry-up and today's relative volume.
pub fn volume_score(frame: &IndicatorFrame, t: usize, config: &ScanConfig) -> u32 {
    let v = &config.volume;
    let mut points = 0i32;

    let climax_start = t.saturating_sub(v.climax_lookback);
    if frame.climax.is_climax[climax_start..t].iter().any(|&c| c) {
        points += CLIMAX_HISTORY_POINTS;
    }

    let dry_start = t.saturating_sub(v.dry_window);
    let dry_days = (dry_start..t)
        .filter(|&i| frame.volume[i] < v.dry_ratio * frame.volume_ma[i])
        .count();
    if dry_days >= v.dry_days_min {
        points += DRY_DAYS_POINTS;
    }

    points += ratio_points(frame.volume_ratio[t], config);

    points.clamp(0, config.scoring.volume as i32) as u32
}

/// Points for today's volume ratio under the configured run mode.
pub fn ratio_points(ratio: f64, config: &ScanConfig) -> i32 {
    let v = &config.volume;
    if ratio.is_nan() || ratio < v.moderate_ratio {
        return 0;
    }
    match config.run_mode {
        RunMode::EndOfDay => {
            if ratio <= v.strong_ratio {
                RATIO_MODERATE_POINTS
            } else if ratio <= v.overheat_ratio {
                RATIO_STRONG_POINTS
            } else {
                RATIO_OVERHEAT_POINTS
            }
        }
        RunMode::RealTime => {
            if ratio <= v.overheat_ratio {
                RATIO_MODERATE_POINTS
            } else {
                RATIO_SPIKE_PENALTY
            }
        }
    }
}

/// Foreign buying streak and 5-day net flows. `None` without a snapshot.
pub fn supply_score(supply: Option<&SupplySnapshot>, config: &ScanConfig) -> Option<u32> {
    let s = supply?;
    let mut points = match s.foreign_consecutive_buy {
        d if d >= 5 => 8,
        d if d >= 3 => 5,
        d if d >= 1 => 2,
        _ => 0,
    };
    if s.inst_net_buy_5d > 0.0 {
        points += 4;
    }
    if s.foreign_net_buy_5d > 0.0 {
        points += 3;
    }
    Some(points.min(config.scoring.supply))
}

/// Starts at the cap and loses points as the stop moves away from the close.
pub fn risk_score(risk_pct: f64, config: &ScanConfig) -> u32 {
    let r = &config.risk;
    let penalty = if risk_pct > r.wide_pct {
        r.wide_penalty
    } else if risk_pct > r.moderate_pct {
        r.moderate_penalty
    } else {
        0
    };
    config.scoring.risk.saturating_sub(penalty)
}
