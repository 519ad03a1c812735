//! Setup detector — pattern flags derived from the indicator frame.
//!
//! Two breakout setups are recognised:
//! - **A (contraction breakout)**: squeeze, close above the upper band,
//!   confirming volume and ADX at or above the minimum.
//! - **B (climax breakout)**: close above the high of the last climax bar seen
//!   before today, with confirming volume. B outranks A.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ScanConfig;
use crate::frame::IndicatorFrame;

/// Detected setup for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Setup {
    #[serde(rename = "B")]
    ClimaxBreakout,
    #[serde(rename = "A")]
    ContractionBreakout,
    #[serde(rename = "no setup")]
    NoSetup,
}

impl Setup {
    pub fn label(&self) -> &'static str {
        match self {
            Setup::ClimaxBreakout => "B",
            Setup::ContractionBreakout => "A",
            Setup::NoSetup => "no setup",
        }
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Volatility contraction: low percentile rank, or bandwidth sitting on its
/// trailing minimum (ties at the floor rank high under rank-by-count).
pub fn is_squeeze(rank: f64, bandwidth: f64, floor: f64, threshold: f64) -> bool {
    if rank.is_nan() || bandwidth.is_nan() {
        return false;
    }
    rank <= threshold || bandwidth <= floor
}

/// Volatility release: high percentile rank with bandwidth above its trailing minimum.
pub fn is_expansion(rank: f64, bandwidth: f64, floor: f64, threshold: f64) -> bool {
    if rank.is_nan() || bandwidth.is_nan() || floor.is_nan() {
        return false;
    }
    rank >= threshold && bandwidth > floor
}

/// Dense per-bar boolean flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSeries {
    pub squeeze: Vec<bool>,
    pub expansion: Vec<bool>,
    /// Close above the upper band.
    pub breakout: Vec<bool>,
    pub volume_confirm: Vec<bool>,
}

impl FlagSeries {
    pub fn compute(frame: &IndicatorFrame, config: &ScanConfig) -> Self {
        let n = frame.len();
        let mut flags = Self {
            squeeze: vec![false; n],
            expansion: vec![false; n],
            breakout: vec![false; n],
            volume_confirm: vec![false; n],
        };

        for t in 0..n {
            let rank = frame.bandwidth_rank[t];
            let bw = frame.bandwidth[t];
            let floor = frame.bandwidth_floor[t];
            flags.squeeze[t] = is_squeeze(rank, bw, floor, config.setup.squeeze_rank);
            flags.expansion[t] = is_expansion(rank, bw, floor, config.setup.expansion_rank);
            flags.breakout[t] = frame.close[t] > frame.upper[t];
            flags.volume_confirm[t] = frame.volume_ratio[t] >= config.volume.vol_confirm_mult;
        }

        flags
    }
}

/// Everything the detector knows about one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupFlags {
    pub squeeze: bool,
    pub expansion: bool,
    pub door_knock: bool,
    pub memory: bool,
    pub breakout: bool,
    pub volume_confirm: bool,
    pub setup_a: bool,
    pub setup_b: bool,
    /// Close of the highest-volume bar in the memory window.
    pub memory_price: f64,
    /// Climax high/low carried into this bar from earlier bars (NaN if none).
    pub climax_high: f64,
    pub climax_low: f64,
    pub setup: Setup,
}

impl SetupFlags {
    /// Names of the flags that fired, in a fixed order.
    pub fn tags(&self) -> Vec<&'static str> {
        [
            (self.squeeze, "squeeze"),
            (self.expansion, "expansion"),
            (self.door_knock, "door_knock"),
            (self.memory, "memory"),
            (self.breakout, "breakout"),
            (self.volume_confirm, "volume_confirm"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Close of the highest-volume bar among the `window` bars ending at `t`.
/// The earliest bar wins ties.
pub fn memory_price(frame: &IndicatorFrame, t: usize, window: usize) -> f64 {
    if t >= frame.len() || window == 0 {
        return f64::NAN;
    }
    let start = (t + 1).saturating_sub(window);
    let mut best = start;
    for i in start..=t {
        if frame.volume[i] > frame.volume[best] {
            best = i;
        }
    }
    frame.close[best]
}

/// Derive setup flags for bar `t`. Returns `None` if `t` is out of range.
pub fn detect(frame: &IndicatorFrame, config: &ScanConfig, t: usize) -> Option<SetupFlags> {
    if t >= frame.len() {
        return None;
    }
    let close = frame.close[t];
    let upper = frame.upper[t];

    let knock = config.setup.door_knock_pct / 100.0;
    let door_knock = upper * (1.0 - knock) <= close && close <= upper * (1.0 + knock);

    let mem = memory_price(frame, t, config.setup.memory_window);
    let memory = (close / mem - 1.0).abs() <= config.setup.memory_tolerance_pct / 100.0;

    let squeeze = frame.flags.squeeze[t];
    let breakout = frame.flags.breakout[t];
    let volume_confirm = frame.flags.volume_confirm[t];

    let setup_a = squeeze && breakout && volume_confirm && frame.adx[t] >= config.trend.adx_min;

    // Level established before today; a climax today cannot be its own breakout.
    let (climax_high, climax_low) = if t > 0 {
        (frame.climax.high[t - 1], frame.climax.low[t - 1])
    } else {
        (f64::NAN, f64::NAN)
    };
    let setup_b = close > climax_high && volume_confirm;

    let setup = if setup_b {
        Setup::ClimaxBreakout
    } else if setup_a {
        Setup::ContractionBreakout
    } else {
        Setup::NoSetup
    };

    Some(SetupFlags {
        squeeze,
        expansion: frame.flags.expansion[t],
        door_knock,
        memory,
        breakout,
        volume_confirm,
        setup_a,
        setup_b,
        memory_price: mem,
        climax_high,
        climax_low,
        setup,
    })
}

/// Setup flags for the most recent bar.
pub fn detect_last(frame: &IndicatorFrame, config: &ScanConfig) -> Option<SetupFlags> {
    frame.len().checked_sub(1).and_then(|t| detect(frame, config, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, PriceSeries};
    use chrono::NaiveDate;

    fn build(closes: &[f64], volumes: &[u64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&c, &v))| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: v,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn squeeze_and_expansion_predicates() {
        assert!(is_squeeze(10.0, 0.05, 0.01, 20.0));
        assert!(!is_squeeze(50.0, 0.05, 0.01, 20.0));
        // sitting on the floor with a tied high rank
        assert!(is_squeeze(100.0, 0.0, 0.0, 20.0));
        assert!(!is_squeeze(f64::NAN, 0.0, 0.0, 20.0));

        assert!(is_expansion(90.0, 0.2, 0.05, 80.0));
        assert!(!is_expansion(100.0, 0.0, 0.0, 80.0));
        assert!(!is_expansion(f64::NAN, 0.2, 0.05, 80.0));
    }

    #[test]
    fn setup_labels() {
        assert_eq!(Setup::ClimaxBreakout.to_string(), "B");
        assert_eq!(Setup::ContractionBreakout.to_string(), "A");
        assert_eq!(Setup::NoSetup.to_string(), "no setup");
        assert_eq!(serde_json::to_string(&Setup::NoSetup).unwrap(), "\"no setup\"");
    }

    #[test]
    fn memory_price_is_close_of_heaviest_bar_first_wins() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let volumes = [10, 50, 20, 50, 10, 10, 10, 10, 10, 10];
        let frame = IndicatorFrame::compute(&build(&closes, &volumes), &ScanConfig::default());
        assert_eq!(memory_price(&frame, 9, 60), 101.0);
        // window of 7 ending at 9 starts at 3
        assert_eq!(memory_price(&frame, 9, 7), 103.0);
    }

    #[test]
    fn door_knock_band() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i % 7) as f64).collect();
        let volumes = vec![1_000u64; 80];
        let frame = IndicatorFrame::compute(&build(&closes, &volumes), &ScanConfig::default());
        let flags = detect_last(&frame, &ScanConfig::default()).unwrap();
        let upper = frame.upper[79];
        let expected = upper * 0.95 <= closes[79] && closes[79] <= upper * 1.05;
        assert_eq!(flags.door_knock, expected);
    }

    #[test]
    fn climax_breakout_uses_prior_level() {
        // 40 quiet bars, a 10x volume bar, more quiet bars, then a higher close on 2x volume.
        let mut closes = vec![100.0; 60];
        let mut volumes = vec![1_000u64; 60];
        volumes[30] = 10_000;
        closes[59] = 104.0;
        volumes[59] = 2_000;

        let cfg = ScanConfig::default();
        let frame = IndicatorFrame::compute(&build(&closes, &volumes), &cfg);
        assert!(frame.climax.is_climax[30]);

        let flags = detect_last(&frame, &cfg).unwrap();
        assert!(flags.volume_confirm);
        assert!(flags.setup_b);
        assert_eq!(flags.setup, Setup::ClimaxBreakout);
        assert!((flags.climax_high - 101.0).abs() < 1e-9);
        assert!((flags.climax_low - 99.0).abs() < 1e-9);
    }

    #[test]
    fn no_climax_no_setup_b() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let volumes = vec![1_000u64; 60];
        let cfg = ScanConfig::default();
        let frame = IndicatorFrame::compute(&build(&closes, &volumes), &cfg);
        let flags = detect_last(&frame, &cfg).unwrap();
        assert!(!flags.setup_b);
        assert!(flags.climax_high.is_nan());
        assert_eq!(flags.setup, Setup::NoSetup);
    }

    #[test]
    fn detect_out_of_range() {
        let frame = IndicatorFrame::compute(&build(&[], &[]), &ScanConfig::default());
        assert!(detect_last(&frame, &ScanConfig::default()).is_none());
    }

    #[test]
    fn tags_list_fired_flags() {
        let flags = SetupFlags {
            squeeze: true,
            expansion: false,
            door_knock: true,
            memory: false,
            breakout: false,
            volume_confirm: true,
            setup_a: false,
            setup_b: false,
            memory_price: 1.0,
            climax_high: f64::NAN,
            climax_low: f64::NAN,
            setup: Setup::NoSetup,
        };
        assert_eq!(flags.tags(), vec!["squeeze", "door_knock", "volume_confirm"]);
    }
}
