//! Parallel scan: load, evaluate and rank a chunk of the universe.
//!
//! Evaluation fans out over rayon's pool with a shared `&ScanConfig`.
//! Rows come back sorted by total score (highest first, ties by code).

use rayon::prelude::*;
use scanlab_core::config::ScanConfig;
use scanlab_core::domain::{PriceSeries, SupplySnapshot};
use scanlab_core::scoring::{evaluate_detailed, Rejection, ScoreRecord};
use scanlab_core::setup::Setup;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::data_loader::{dataset_hash, load_series, DataSource, LoadError, LoadOptions};
use crate::universe::{passes_min_close, UniverseEntry};

/// One flat output row: a score record joined with universe and supply metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRow {
    pub code: String,
    pub name: String,
    pub sector: String,
    pub date: chrono::NaiveDate,
    pub close: f64,
    pub total_score: u32,
    pub trend_score: u32,
    pub pattern_score: u32,
    pub volume_score: u32,
    pub supply_score: Option<u32>,
    pub risk_score: u32,
    pub liquidity_score: u32,
    pub setup: Setup,
    pub stop: f64,
    pub risk_pct: f64,
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
    /// Fired setup flags joined with `|`.
    pub tags: String,
    pub foreign_consec_buy: Option<u32>,
    pub foreign_net_5d: Option<f64>,
    pub inst_net_5d: Option<f64>,
    pub synthetic: bool,
}

impl ScanRow {
    pub fn new(
        entry: &UniverseEntry,
        record: ScoreRecord,
        supply: Option<&SupplySnapshot>,
        source: DataSource,
    ) -> Self {
        Self {
            code: entry.code.clone(),
            name: entry.name.clone(),
            sector: entry.sector_or_default().to_string(),
            date: record.date,
            close: record.close,
            total_score: record.total_score,
            trend_score: record.trend_score,
            pattern_score: record.pattern_score,
            volume_score: record.volume_score,
            supply_score: record.supply_score,
            risk_score: record.risk_score,
            liquidity_score: record.liquidity_score,
            setup: record.setup,
            stop: record.stop,
            risk_pct: record.risk_pct,
            vol_ratio: record.vol_ratio,
            adx: record.adx,
            bandwidth_rank: record.bandwidth_rank,
            ma20: record.ma20,
            ma50: record.ma50,
            ma200: record.ma200,
            bb_upper: record.bb_upper,
            bb_mid: record.bb_mid,
            bb_lower: record.bb_lower,
            memory_price: record.memory_price,
            avg_traded_value: record.avg_traded_value,
            tags: record.tags.join("|"),
            foreign_consec_buy: supply.map(|s| s.foreign_consecutive_buy),
            foreign_net_5d: supply.map(|s| s.foreign_net_buy_5d),
            inst_net_5d: supply.map(|s| s.inst_net_buy_5d),
            synthetic: source == DataSource::Synthetic,
        }
    }
}

/// A symbol ready for evaluation.
#[derive(Debug, Clone)]
pub struct ScanInput {
    pub entry: UniverseEntry,
    pub series: PriceSeries,
    pub source: DataSource,
}

/// Outcome of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub rows: Vec<ScanRow>,
    /// Symbols that reached the scoring engine.
    pub evaluated: usize,
    /// Evaluated symbols the engine declared not applicable.
    pub rejected: usize,
    /// Symbols dropped before evaluation (missing data, load errors, price floor).
    pub skipped: usize,
    pub config_fingerprint: String,
    pub dataset_hash: String,
}

impl ScanReport {
    pub fn accepted(&self) -> usize {
        self.rows.len()
    }

    pub fn has_synthetic(&self) -> bool {
        self.rows.iter().any(|r| r.synthetic)
    }
}

/// Highest total first; equal totals ordered by code.
pub fn sort_rows(rows: &mut [ScanRow]) {
    rows.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.code.cmp(&b.code))
    });
}

/// Load every entry, dropping failures and symbols under the close floor.
/// Returns the inputs and the number skipped.
pub fn load_inputs(
    entries: &[UniverseEntry],
    opts: &LoadOptions,
    config: &ScanConfig,
) -> (Vec<ScanInput>, usize) {
    let results: Vec<Option<ScanInput>> = entries
        .par_iter()
        .map(|entry| match load_series(&entry.code, opts) {
            Ok(loaded) => {
                if !passes_min_close(&loaded.series, &config.universe) {
                    debug!(symbol = %entry.code, "below universe.min_close");
                    return None;
                }
                Some(ScanInput {
                    series: loaded.series.with_market_cap(entry.market_cap),
                    source: loaded.source,
                    entry: entry.clone(),
                })
            }
            Err(e) => {
                warn!(symbol = %entry.code, error = %e, "skipping symbol");
                None
            }
        })
        .collect();

    let skipped = results.iter().filter(|r| r.is_none()).count();
    (results.into_iter().flatten().collect(), skipped)
}

/// Evaluate all inputs in parallel and rank the accepted rows.
///
/// `skipped` is carried into the report so callers can account for symbols
/// dropped while loading.
pub fn scan(
    inputs: &[ScanInput],
    supply: &HashMap<String, SupplySnapshot>,
    config: &ScanConfig,
    skipped: usize,
) -> ScanReport {
    let mut rows: Vec<ScanRow> = inputs
        .par_iter()
        .filter_map(|input| {
            let snapshot = supply.get(&input.entry.code);
            match evaluate_detailed(&input.series, config, snapshot) {
                Ok(record) => Some(ScanRow::new(&input.entry, record, snapshot, input.source)),
                Err(reason) => {
                    debug!(symbol = %input.entry.code, %reason, "not applicable");
                    None
                }
            }
        })
        .collect();
    sort_rows(&mut rows);

    let evaluated = inputs.len();
    let rejected = evaluated - rows.len();
    info!(
        evaluated,
        accepted = rows.len(),
        rejected,
        skipped,
        "scan complete"
    );

    ScanReport {
        evaluated,
        rejected,
        skipped,
        config_fingerprint: config.fingerprint(),
        dataset_hash: dataset_hash(inputs.iter().map(|i| &i.series)),
        rows,
    }
}

/// Load and score one symbol outside a universe scan.
///
/// The outer error is a load failure; the inner result is the engine's
/// verdict. The symbol's snapshot, if `supply` holds one, feeds the supply score.
pub fn evaluate_symbol(
    symbol: &str,
    opts: &LoadOptions,
    config: &ScanConfig,
    market_cap: Option<f64>,
    supply: &HashMap<String, SupplySnapshot>,
) -> Result<Result<ScoreRecord, Rejection>, LoadError> {
    let loaded = load_series(symbol, opts)?;
    if loaded.source == DataSource::Synthetic {
        warn!(symbol, "scoring synthetic data");
    }
    let series = loaded.series.with_market_cap(market_cap);
    let snapshot = supply.get(symbol);
    if !supply.is_empty() && snapshot.is_none() {
        warn!(symbol, "no supply snapshot for symbol");
    }
    Ok(evaluate_detailed(&series, config, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_bars;
    use scanlab_core::domain::Bar;

    fn entry(code: &str) -> UniverseEntry {
        UniverseEntry {
            code: code.into(),
            name: format!("Name {code}"),
            sector: None,
            market_cap: None,
        }
    }

    fn ascending(code: &str, n: usize, step: f64) -> PriceSeries {
        let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| {
                let c = 10_000.0 + step * i as f64;
                Bar {
                    date: base + chrono::Duration::days(i as i64),
                    open: c,
                    high: c + 20.0,
                    low: c - 20.0,
                    close: c,
                    volume: 1_000_000,
                }
            })
            .collect();
        PriceSeries::new(code, bars).unwrap()
    }

    fn input(code: &str, series: PriceSeries) -> ScanInput {
        ScanInput {
            entry: entry(code),
            series,
            source: DataSource::Csv,
        }
    }

    #[test]
    fn scan_counts_and_sorts() {
        let inputs = vec![
            input("B", ascending("B", 250, 10.0)),
            input("A", ascending("A", 250, 10.0)),
            input("SHORT", ascending("SHORT", 50, 10.0)),
        ];
        let mut supply = HashMap::new();
        supply.insert(
            "B".to_string(),
            SupplySnapshot {
                foreign_consecutive_buy: 5,
                inst_consecutive_buy: 0,
                foreign_net_buy_5d: 1.0,
                inst_net_buy_5d: 1.0,
            },
        );

        let report = scan(&inputs, &supply, &ScanConfig::default(), 2);
        assert_eq!(report.evaluated, 3);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.accepted(), 2);
        // B has supply points so ranks first
        assert_eq!(report.rows[0].code, "B");
        assert_eq!(report.rows[0].foreign_consec_buy, Some(5));
        assert_eq!(report.rows[1].code, "A");
        assert_eq!(report.rows[1].supply_score, None);
        assert!(!report.has_synthetic());
        assert_eq!(report.config_fingerprint, ScanConfig::default().fingerprint());
    }

    #[test]
    fn ties_break_by_code() {
        let mut rows: Vec<ScanRow> = ["C", "A", "B"]
            .iter()
            .map(|code| {
                let series = ascending(code, 250, 10.0);
                let rec = evaluate_detailed(&series, &ScanConfig::default(), None).unwrap();
                ScanRow::new(&entry(code), rec, None, DataSource::Csv)
            })
            .collect();
        sort_rows(&mut rows);
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn load_inputs_skips_missing_and_flags_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let entries = vec![entry("MISSING")];
        let opts = LoadOptions::new(dir.path(), end);

        let (inputs, skipped) = load_inputs(&entries, &opts, &ScanConfig::default());
        assert!(inputs.is_empty());
        assert_eq!(skipped, 1);

        let mut synthetic = opts.clone();
        synthetic.synthetic = true;
        let (inputs, skipped) = load_inputs(&entries, &synthetic, &ScanConfig::default());
        assert_eq!(skipped, 0);
        assert_eq!(inputs[0].source, DataSource::Synthetic);
        assert_eq!(
            inputs[0].series.bars(),
            &generate_synthetic_bars("MISSING", end, 300)[..]
        );
    }

    #[test]
    fn min_close_floor_skips_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let mut opts = LoadOptions::new(dir.path(), end);
        opts.synthetic = true;
        let mut cfg = ScanConfig::default();
        cfg.universe.min_close = Some(1.0e12);
        let (inputs, skipped) = load_inputs(&[entry("X")], &opts, &cfg);
        assert!(inputs.is_empty());
        assert_eq!(skipped, 1);
    }
}
