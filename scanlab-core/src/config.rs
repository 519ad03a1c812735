//! Scan configuration — immutable thresholds shared by every evaluation in a run.
//!
//! Loaded from TOML. Sections `bollinger`, `trend`, `volume` and `risk` are
//! required; everything else falls back to the canonical defaults. Unknown keys
//! are ignored. Validation happens once at load time so that per-symbol
//! evaluation never has to deal with a malformed configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::indicators::VOLUME_AVG_PERIOD;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Volume-confirm scoring policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Full-session volume: a strong breakout ratio earns the most points.
    #[default]
    EndOfDay,
    /// Intraday volume: an excessive ratio is penalized as a likely news spike.
    RealTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerConfig {
    pub length: usize,
    pub stdev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    pub adx_len: usize,
    pub adx_min: f64,
    /// ADX level that earns the full ADX award.
    #[serde(default = "default_adx_strong")]
    pub adx_strong: f64,
    /// Short, medium and long moving-average periods.
    #[serde(default = "default_ma_periods")]
    pub ma_periods: [usize; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    pub climax_mult: f64,
    pub vol_confirm_mult: f64,
    pub dry_ratio: f64,
    #[serde(default = "default_moderate_ratio")]
    pub moderate_ratio: f64,
    #[serde(default = "default_strong_ratio")]
    pub strong_ratio: f64,
    #[serde(default = "default_overheat_ratio")]
    pub overheat_ratio: f64,
    /// Bars before today searched for a past climax.
    #[serde(default = "default_climax_lookback")]
    pub climax_lookback: usize,
    /// Bars before today searched for dry (low-volume) days.
    #[serde(default = "default_dry_window")]
    pub dry_window: usize,
    #[serde(default = "default_dry_days_min")]
    pub dry_days_min: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Reject when the stop is further than this from the close (percent).
    pub hard_stop_pct: f64,
    #[serde(default = "default_risk_moderate_pct")]
    pub moderate_pct: f64,
    #[serde(default = "default_risk_wide_pct")]
    pub wide_pct: f64,
    #[serde(default = "default_risk_moderate_penalty")]
    pub moderate_penalty: u32,
    #[serde(default = "default_risk_wide_penalty")]
    pub wide_penalty: u32,
    /// Bars (including today) whose lowest low is the default stop.
    #[serde(default = "default_stop_lookback")]
    pub stop_lookback: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub squeeze_rank: f64,
    pub expansion_rank: f64,
    pub door_knock_pct: f64,
    pub memory_window: usize,
    pub memory_tolerance_pct: f64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            squeeze_rank: 20.0,
            expansion_rank: 80.0,
            door_knock_pct: 5.0,
            memory_window: 60,
            memory_tolerance_pct: 5.0,
        }
    }
}

/// Per-category score caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub trend: u32,
    pub pattern: u32,
    pub volume: u32,
    pub supply: u32,
    pub risk: u32,
    pub liquidity: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            trend: 25,
            pattern: 30,
            volume: 20,
            supply: 15,
            risk: 10,
            liquidity: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// Bars averaged for the traded-value gate.
    pub window: usize,
    /// Hard floor on average close × volume.
    pub min_avg_traded_value: f64,
    /// Floor on average traded value as a percent of market cap (when known).
    pub min_turnover_pct: f64,
    pub moderate_traded_value: f64,
    pub strong_traded_value: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            window: 20,
            min_avg_traded_value: 1.0e9,
            min_turnover_pct: 0.05,
            moderate_traded_value: 1.0e10,
            strong_traded_value: 5.0e10,
        }
    }
}

/// Universe pre-filters. Consumed by the batch driver, not the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_mktcap: Option<f64>,
}

/// Complete, validated configuration for a scan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_bandwidth_lookback")]
    pub bandwidth_lookback: usize,
    #[serde(default)]
    pub run_mode: RunMode,
    pub bollinger: BollingerConfig,
    pub trend: TrendConfig,
    pub volume: VolumeConfig,
    pub risk: RiskConfig,
    #[serde(default)]
    pub setup: SetupConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub liquidity: LiquidityConfig,
    #[serde(default)]
    pub universe: UniverseFilter,
}

fn default_bandwidth_lookback() -> usize {
    120
}
fn default_adx_strong() -> f64 {
    30.0
}
fn default_ma_periods() -> [usize; 3] {
    [20, 50, 200]
}
fn default_moderate_ratio() -> f64 {
    1.2
}
fn default_strong_ratio() -> f64 {
    2.0
}
fn default_overheat_ratio() -> f64 {
    3.0
}
fn default_climax_lookback() -> usize {
    59
}
fn default_dry_window() -> usize {
    14
}
fn default_dry_days_min() -> usize {
    3
}
fn default_risk_moderate_pct() -> f64 {
    5.0
}
fn default_risk_wide_pct() -> f64 {
    10.0
}
fn default_risk_moderate_penalty() -> u32 {
    2
}
fn default_risk_wide_penalty() -> u32 {
    5
}
fn default_stop_lookback() -> usize {
    10
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bandwidth_lookback: default_bandwidth_lookback(),
            run_mode: RunMode::default(),
            bollinger: BollingerConfig {
                length: 60,
                stdev: 2.0,
            },
            trend: TrendConfig {
                adx_len: 14,
                adx_min: 20.0,
                adx_strong: default_adx_strong(),
                ma_periods: default_ma_periods(),
            },
            volume: VolumeConfig {
                climax_mult: 3.0,
                vol_confirm_mult: 1.5,
                dry_ratio: 0.7,
                moderate_ratio: default_moderate_ratio(),
                strong_ratio: default_strong_ratio(),
                overheat_ratio: default_overheat_ratio(),
                climax_lookback: default_climax_lookback(),
                dry_window: default_dry_window(),
                dry_days_min: default_dry_days_min(),
            },
            risk: RiskConfig {
                hard_stop_pct: 15.0,
                moderate_pct: default_risk_moderate_pct(),
                wide_pct: default_risk_wide_pct(),
                moderate_penalty: default_risk_moderate_penalty(),
                wide_penalty: default_risk_wide_penalty(),
                stop_lookback: default_stop_lookback(),
            },
            setup: SetupConfig::default(),
            scoring: ScoringWeights::default(),
            liquidity: LiquidityConfig::default(),
            universe: UniverseFilter::default(),
        }
    }
}

impl ScanConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.into()))
        }
        fn positive(name: &str, v: f64) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                invalid(format!("{name} must be positive and finite, got {v}"))
            }
        }

        if self.bollinger.length < 2 {
            return invalid("bollinger.length must be >= 2");
        }
        positive("bollinger.stdev", self.bollinger.stdev)?;
        if self.bandwidth_lookback < 2 {
            return invalid("bandwidth_lookback must be >= 2");
        }

        if self.trend.adx_len < 1 {
            return invalid("trend.adx_len must be >= 1");
        }
        let [short, mid, long] = self.trend.ma_periods;
        if short == 0 || !(short < mid && mid < long) {
            return invalid(format!(
                "trend.ma_periods must be strictly increasing and positive, got {:?}",
                self.trend.ma_periods
            ));
        }
        if self.trend.adx_strong < self.trend.adx_min {
            return invalid("trend.adx_strong must be >= trend.adx_min");
        }

        positive("volume.climax_mult", self.volume.climax_mult)?;
        positive("volume.vol_confirm_mult", self.volume.vol_confirm_mult)?;
        positive("volume.dry_ratio", self.volume.dry_ratio)?;
        let v = &self.volume;
        if !(v.moderate_ratio <= v.strong_ratio && v.strong_ratio <= v.overheat_ratio) {
            return invalid("volume ratio tiers must satisfy moderate <= strong <= overheat");
        }
        if v.climax_lookback == 0 || v.dry_window == 0 {
            return invalid("volume.climax_lookback and volume.dry_window must be >= 1");
        }

        let r = &self.risk;
        if !(r.hard_stop_pct > 0.0 && r.hard_stop_pct <= 100.0) {
            return invalid(format!(
                "risk.hard_stop_pct must be in (0, 100], got {}",
                r.hard_stop_pct
            ));
        }
        if r.moderate_pct > r.wide_pct {
            return invalid("risk.moderate_pct must be <= risk.wide_pct");
        }
        if r.stop_lookback == 0 {
            return invalid("risk.stop_lookback must be >= 1");
        }

        let s = &self.setup;
        if !(0.0..=100.0).contains(&s.squeeze_rank) || !(0.0..=100.0).contains(&s.expansion_rank) {
            return invalid("setup ranks must lie in [0, 100]");
        }
        if s.memory_window == 0 {
            return invalid("setup.memory_window must be >= 1");
        }

        if self.liquidity.window == 0 {
            return invalid("liquidity.window must be >= 1");
        }
        if self.liquidity.min_avg_traded_value < 0.0 || self.liquidity.min_turnover_pct < 0.0 {
            return invalid("liquidity floors must be >= 0");
        }

        Ok(())
    }

    /// Shortest series that can be evaluated. Shorter series are "not applicable".
    pub fn warmup_bars(&self) -> usize {
        let longest_ma = self.trend.ma_periods[2];
        let ranked_bandwidth = self.bollinger.length + self.bandwidth_lookback - 1;
        let adx = 2 * self.trend.adx_len - 1;
        let volume_history = VOLUME_AVG_PERIOD + self.volume.dry_window;
        let climax_history = self.volume.climax_lookback + 1;

        [
            longest_ma,
            ranked_bandwidth,
            adx,
            self.setup.memory_window,
            volume_history,
            climax_history,
            self.liquidity.window,
            self.risk.stop_lookback,
        ]
        .into_iter()
        .max()
        .unwrap_or(longest_ma)
    }

    /// Maximum total score reachable with these weights.
    pub fn max_total(&self) -> u32 {
        let w = &self.scoring;
        w.trend + w.pattern + w.volume + w.supply + w.risk + w.liquidity
    }

    /// Deterministic BLAKE3 digest of the configuration, used to tag result sets.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
