//! ScanLab Runner — batch driver around `scanlab-core`.
//!
//! This crate builds on `scanlab-core` to provide:
//! - Bar loading from per-symbol CSV files with synthetic fallback
//! - Universe definition, market-cap ordering and chunking
//! - Investor-flow snapshot loading
//! - Parallel scanning with ranked output rows
//! - CSV/JSON export and merging of chunked partial results

pub mod data_loader;
pub mod export;
pub mod scan;
pub mod supply;
pub mod universe;

pub use data_loader::{load_series, DataSource, LoadError, LoadOptions, LoadedSeries};
pub use export::{merge_partials, write_run_output, MergeSummary};
pub use scan::{evaluate_symbol, load_inputs, scan, ScanInput, ScanReport, ScanRow};
pub use supply::load_supply;
pub use universe::{Universe, UniverseEntry, UniverseError};
