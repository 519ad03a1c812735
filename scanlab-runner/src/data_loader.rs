//! Bar loading for the batch driver.
//!
//! Given a symbol, loads daily bars from `<data_dir>/<SYMBOL>.csv`. Fallback policy:
//! 1. If the CSV exists → parse it
//! 2. If not and `synthetic` is set → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only debug mode. Rows scored on synthetic
//! data carry a `synthetic` flag in the output.

use chrono::{Datelike, NaiveDate};
use scanlab_core::domain::{Bar, PriceSeries};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data for '{symbol}' in {dir} (use --synthetic for synthetic data)")]
    NotFound { symbol: String, dir: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path} line {line}: {reason}")]
    BadRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

/// Where a symbol's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory holding one `<SYMBOL>.csv` per symbol.
    pub data_dir: PathBuf,
    /// If true, generate synthetic bars when no CSV exists.
    pub synthetic: bool,
    /// Length of a synthetic series.
    pub synthetic_bars: usize,
    /// Last date of a synthetic series.
    pub end: NaiveDate,
}

impl LoadOptions {
    pub fn new(data_dir: impl Into<PathBuf>, end: NaiveDate) -> Self {
        Self {
            data_dir: data_dir.into(),
            synthetic: false,
            synthetic_bars: 300,
            end,
        }
    }
}

/// A loaded series and its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
}

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Parse a `Date,Open,High,Low,Close,Volume` CSV. Header names are matched
/// case-insensitively and extra columns are ignored. Rows with an empty
/// price field, and bars failing [`Bar::is_sane`], are skipped.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut index = [0usize; 6];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })?;
    }

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    let mut insane = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let bad = |reason: String| LoadError::BadRow {
            path: path.to_path_buf(),
            line,
            reason,
        };
        let field = |i: usize| record.get(index[i]).unwrap_or("");

        if (1..5).any(|i| field(i).is_empty()) {
            skipped += 1;
            continue;
        }

        let date = parse_date(field(0)).ok_or_else(|| bad(format!("bad date '{}'", field(0))))?;
        let mut prices = [0.0f64; 4];
        for (k, price) in prices.iter_mut().enumerate() {
            let raw = field(k + 1);
            *price = raw
                .parse()
                .map_err(|_| bad(format!("bad {} '{raw}'", COLUMNS[k + 1])))?;
        }
        let raw_volume = field(5);
        let volume: f64 = raw_volume
            .parse()
            .map_err(|_| bad(format!("bad volume '{raw_volume}'")))?;

        let bar = Bar {
            date,
            open: prices[0],
            high: prices[1],
            low: prices[2],
            close: prices[3],
            volume: volume.max(0.0).round() as u64,
        };
        if !bar.is_sane() {
            debug!(path = %path.display(), line, "skipping bar with inconsistent prices");
            insane += 1;
            continue;
        }
        bars.push(bar);
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped rows with missing prices");
    }
    if insane > 0 {
        debug!(path = %path.display(), insane, "skipped rows failing the OHLC sanity check");
    }
    Ok(bars)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Path of the CSV for `symbol`.
pub fn csv_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{symbol}.csv"))
}

/// Load one symbol with the CSV → synthetic → error fallback.
pub fn load_series(symbol: &str, opts: &LoadOptions) -> Result<LoadedSeries, LoadError> {
    let path = csv_path(&opts.data_dir, symbol);
    if path.is_file() {
        let bars = read_bars_csv(&path)?;
        return Ok(LoadedSeries {
            series: PriceSeries::from_unsorted(symbol, bars),
            source: DataSource::Csv,
        });
    }

    if opts.synthetic {
        warn!(symbol, "generating synthetic data, results will be tagged as synthetic");
        let bars = generate_synthetic_bars(symbol, opts.end, opts.synthetic_bars);
        return Ok(LoadedSeries {
            series: PriceSeries::from_unsorted(symbol, bars),
            source: DataSource::Synthetic,
        });
    }

    Err(LoadError::NotFound {
        symbol: symbol.to_string(),
        dir: opts.data_dir.clone(),
    })
}

/// Deterministic BLAKE3 hash over every bar of every series, in symbol order.
pub fn dataset_hash<'a>(series: impl IntoIterator<Item = &'a PriceSeries>) -> String {
    let mut all: Vec<&PriceSeries> = series.into_iter().collect();
    all.sort_by(|a, b| a.symbol().cmp(b.symbol()));

    let mut hasher = blake3::Hasher::new();
    for s in all {
        hasher.update(s.symbol().as_bytes());
        for bar in s.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `n` weekday bars ending at `end` for testing/development.
///
/// A random walk from 10,000 seeded by the symbol name, so the same symbol
/// always produces the same series.
pub fn generate_synthetic_bars(symbol: &str, end: NaiveDate, n: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::with_capacity(n);
    let mut current = end;
    while dates.len() < n {
        if !matches!(current.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            dates.push(current);
        }
        current -= chrono::Duration::days(1);
    }
    dates.reverse();

    let mut price = 10_000.0_f64;
    dates
        .into_iter()
        .map(|date| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            price = close;
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}
