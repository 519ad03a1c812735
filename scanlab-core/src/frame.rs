//! Indicator frame — every per-bar series one evaluation needs, aligned to the input.
//!
//! Built from scratch for each evaluation and dropped afterwards. Undefined
//! points are `f64::NAN`; boolean flags are false wherever an input is undefined.

use crate::config::ScanConfig;
use crate::domain::PriceSeries;
use crate::indicators::{
    average_directional_index, bandwidth, bollinger_bands, climax_bars, percentile_rank,
    rolling_mean, rolling_min, volume_ratio, ClimaxLevels, VOLUME_AVG_PERIOD,
};
use crate::setup::FlagSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub close: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub volume: Vec<f64>,
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub bandwidth: Vec<f64>,
    /// Rank-by-count percentile of bandwidth over `bandwidth_lookback`.
    pub bandwidth_rank: Vec<f64>,
    /// Minimum bandwidth over the same trailing window as the rank.
    pub bandwidth_floor: Vec<f64>,
    pub adx: Vec<f64>,
    pub ma_short: Vec<f64>,
    pub ma_mid: Vec<f64>,
    pub ma_long: Vec<f64>,
    pub volume_ma: Vec<f64>,
    pub volume_ratio: Vec<f64>,
    pub climax: ClimaxLevels,
    pub flags: FlagSeries,
}

impl IndicatorFrame {
    pub fn compute(series: &PriceSeries, config: &ScanConfig) -> Self {
        let close = series.closes();
        let high = series.highs();
        let low = series.lows();
        let volume = series.volumes();

        let bands = bollinger_bands(&close, config.bollinger.length, config.bollinger.stdev);
        let bw = bandwidth(&bands.mid, &bands.upper, &bands.lower);
        let bandwidth_rank = percentile_rank(&bw, config.bandwidth_lookback);
        let bandwidth_floor = rolling_min(&bw, config.bandwidth_lookback);
        let adx = average_directional_index(&high, &low, &close, config.trend.adx_len);

        let [short, mid, long] = config.trend.ma_periods;
        let ma_short = rolling_mean(&close, short);
        let ma_mid = rolling_mean(&close, mid);
        let ma_long = rolling_mean(&close, long);

        let volume_ma = rolling_mean(&volume, VOLUME_AVG_PERIOD);
        let volume_ratio = volume_ratio(&volume, VOLUME_AVG_PERIOD);
        let climax = climax_bars(
            &volume,
            &high,
            &low,
            config.volume.climax_mult,
            VOLUME_AVG_PERIOD,
        );

        let mut frame = Self {
            close,
            high,
            low,
            volume,
            mid: bands.mid,
            upper: bands.upper,
            lower: bands.lower,
            bandwidth: bw,
            bandwidth_rank,
            bandwidth_floor,
            adx,
            ma_short,
            ma_mid,
            ma_long,
            volume_ma,
            volume_ratio,
            climax,
            flags: FlagSeries::default(),
        };
        frame.flags = FlagSeries::compute(&frame, config);
        frame
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}
