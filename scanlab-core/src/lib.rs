//! ScanLab Core — indicators, setup detection and tradeability scoring.
//!
//! This crate is the signal-and-scoring engine:
//! - Domain types (bars, price series, investor-flow snapshots)
//! - Rolling-window indicator library (Bollinger, ADX, percentile rank, volume)
//! - Per-evaluation indicator frame and setup detector
//! - Gated, capped multi-factor scoring into a `ScoreRecord`
//! - TOML configuration with validation and fingerprinting
//!
//! Evaluation is pure: no state survives between calls.

pub mod config;
pub mod domain;
pub mod frame;
pub mod indicators;
pub mod scoring;
pub mod setup;

pub use config::{ConfigError, RunMode, ScanConfig};
pub use domain::{Bar, PriceSeries, SeriesError, SupplySnapshot};
pub use frame::IndicatorFrame;
pub use scoring::{evaluate, evaluate_detailed, Rejection, ScoreRecord};
pub use setup::{Setup, SetupFlags};
