//! Integration tests for the batch pipeline: CSV bars in, ranked CSV/JSON out.
//!
//! Each test builds a throwaway data directory with `tempfile`, runs the
//! loader → scan → export path and reads the files back.

use chrono::NaiveDate;
use scanlab_core::{Rejection, ScanConfig};
use scanlab_runner::data_loader::{generate_synthetic_bars, LoadOptions};
use scanlab_runner::export::{
    full_file_name, partial_file_name, read_csv, write_json, LATEST_FILE, PARTIAL_DIR,
};
use scanlab_runner::universe::chunk;
use scanlab_runner::{
    evaluate_symbol, load_inputs, load_supply, merge_partials, scan, write_run_output, LoadError,
    ScanReport, Universe,
};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

const UNIVERSE: &str = r#"
    [[stock]]
    code = "AAA"
    name = "Alpha"
    sector = "Tech"
    market_cap = 3.0e12

    [[stock]]
    code = "BBB"
    name = "Beta"
    market_cap = 2.0e12

    [[stock]]
    code = "CCC"
    name = "Gamma"
    market_cap = 1.0e12

    [[stock]]
    code = "SHORT"
    name = "Too short"
    market_cap = 5.0e11
"#;

fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

/// Write `<code>.csv` with an ascending series, newest row first.
fn write_ascending_csv(dir: &Path, code: &str, n: usize, step: f64) {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut body = String::from("Date,Open,High,Low,Close,Volume\n");
    for i in (0..n).rev() {
        let c = 10_000.0 + step * i as f64;
        let date = base + chrono::Duration::days(i as i64);
        writeln!(body, "{date},{c},{},{},{c},1000000", c + 20.0, c - 20.0).unwrap();
    }
    std::fs::write(dir.join(format!("{code}.csv")), body).unwrap();
}

fn write_synthetic_csv(dir: &Path, code: &str) {
    let mut body = String::from("date,open,high,low,close,volume\n");
    for b in generate_synthetic_bars(code, end(), 260) {
        writeln!(
            body,
            "{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{code}.csv")), body).unwrap();
}

fn fixture() -> (tempfile::TempDir, Universe) {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    write_ascending_csv(&data, "AAA", 250, 10.0);
    write_ascending_csv(&data, "BBB", 250, 12.0);
    write_synthetic_csv(&data, "CCC");
    write_ascending_csv(&data, "SHORT", 60, 10.0);
    (dir, Universe::from_toml(UNIVERSE).unwrap())
}

#[test]
fn full_scan_ranks_and_counts() {
    let (dir, universe) = fixture();
    let cfg = ScanConfig::default();
    let opts = LoadOptions::new(dir.path().join("data"), end());

    let entries = universe.eligible(&cfg.universe);
    let (inputs, skipped) = load_inputs(&entries, &opts, &cfg);
    assert_eq!(inputs.len(), 4);
    assert_eq!(skipped, 0);

    let report = scan(&inputs, &HashMap::new(), &cfg, skipped);
    assert_eq!(report.evaluated, 4);
    assert!(report.rejected >= 1, "SHORT must be rejected");
    assert!(report.rows.iter().all(|r| r.code != "SHORT"));
    assert!(report
        .rows
        .windows(2)
        .all(|w| w[0].total_score >= w[1].total_score));
    assert!(!report.has_synthetic());

    let aaa = report.rows.iter().find(|r| r.code == "AAA").unwrap();
    assert_eq!(aaa.sector, "Tech");
    assert!(aaa.stop < aaa.close);
}

#[test]
fn supply_file_feeds_scores() {
    let (dir, universe) = fixture();
    let supply_path = dir.path().join("supply.csv");
    std::fs::write(
        &supply_path,
        "code,foreign_consecutive_buy,inst_consecutive_buy,foreign_net_buy_5d,inst_net_buy_5d\n\
         AAA,5,2,1e9,1e9\n",
    )
    .unwrap();
    let supply = load_supply(&supply_path).unwrap();

    let cfg = ScanConfig::default();
    let opts = LoadOptions::new(dir.path().join("data"), end());
    let (inputs, skipped) = load_inputs(&universe.eligible(&cfg.universe), &opts, &cfg);
    let report = scan(&inputs, &supply, &cfg, skipped);

    let aaa = report.rows.iter().find(|r| r.code == "AAA").unwrap();
    assert_eq!(aaa.supply_score, Some(15));
    assert_eq!(aaa.foreign_consec_buy, Some(5));
    let bbb = report.rows.iter().find(|r| r.code == "BBB").unwrap();
    assert_eq!(bbb.supply_score, None);
    assert_eq!(bbb.foreign_net_5d, None);
}

#[test]
fn chunked_runs_merge_into_dated_and_latest_files() {
    let (dir, universe) = fixture();
    let cfg = ScanConfig::default();
    let opts = LoadOptions::new(dir.path().join("data"), end());
    let out = dir.path().join("out");
    let entries = universe.eligible(&cfg.universe);

    let mut total_rows = 0;
    for n in 1..=2 {
        let (inputs, skipped) = load_inputs(chunk(&entries, n, 2), &opts, &cfg);
        let report = scan(&inputs, &HashMap::new(), &cfg, skipped);
        total_rows += report.rows.len();
        let path = write_run_output(&out, end(), Some(n), &report.rows).unwrap();
        assert_eq!(
            path,
            out.join(PARTIAL_DIR).join(partial_file_name(end(), n))
        );
    }

    // a re-run of chunk 1 under another name must not be picked up
    std::fs::write(out.join(PARTIAL_DIR).join("notes.txt"), "ignore me").unwrap();

    let summary = merge_partials(&out, end()).unwrap();
    assert_eq!(summary.files, 2);
    assert_eq!(summary.rows, total_rows);
    assert_eq!(summary.duplicates, 0);
    assert_eq!(summary.output, out.join(full_file_name(end())));

    let merged = read_csv(&summary.output).unwrap();
    let latest = read_csv(&out.join(LATEST_FILE)).unwrap();
    assert_eq!(merged.len(), total_rows);
    assert_eq!(
        merged.iter().map(|r| &r.code).collect::<Vec<_>>(),
        latest.iter().map(|r| &r.code).collect::<Vec<_>>()
    );
    assert!(merged.windows(2).all(|w| w[0].total_score >= w[1].total_score));
}

#[test]
fn merge_keeps_first_occurrence_of_a_code() {
    let (dir, universe) = fixture();
    let cfg = ScanConfig::default();
    let opts = LoadOptions::new(dir.path().join("data"), end());
    let out = dir.path().join("out");
    let (inputs, skipped) = load_inputs(&universe.eligible(&cfg.universe), &opts, &cfg);
    let report = scan(&inputs, &HashMap::new(), &cfg, skipped);

    write_run_output(&out, end(), Some(1), &report.rows).unwrap();
    write_run_output(&out, end(), Some(2), &report.rows).unwrap();

    let summary = merge_partials(&out, end()).unwrap();
    assert_eq!(summary.rows, report.rows.len());
    assert_eq!(summary.duplicates, report.rows.len());
}

#[test]
fn unchunked_run_writes_latest_and_json_round_trips() {
    let (dir, universe) = fixture();
    let cfg = ScanConfig::default();
    let opts = LoadOptions::new(dir.path().join("data"), end());
    let out = dir.path().join("out");
    let (inputs, skipped) = load_inputs(&universe.eligible(&cfg.universe), &opts, &cfg);
    let report = scan(&inputs, &HashMap::new(), &cfg, skipped);

    let path = write_run_output(&out, end(), None, &report.rows).unwrap();
    assert_eq!(path, out.join(full_file_name(end())));
    let rows = read_csv(&out.join(LATEST_FILE)).unwrap();
    assert_eq!(rows.len(), report.rows.len());
    assert_eq!(rows[0].setup, report.rows[0].setup);
    assert_eq!(rows[0].tags, report.rows[0].tags);

    let json_path = out.join("report.json");
    write_json(&json_path, &report).unwrap();
    let back: ScanReport =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back.evaluated, report.evaluated);
    assert_eq!(back.config_fingerprint, report.config_fingerprint);
    assert_eq!(back.rows.len(), report.rows.len());
}

#[test]
fn market_cap_floor_and_missing_files_are_skipped() {
    let (dir, universe) = fixture();
    let mut cfg = ScanConfig::default();
    cfg.universe.min_mktcap = Some(1.5e12);
    std::fs::remove_file(dir.path().join("data").join("BBB.csv")).unwrap();

    let opts = LoadOptions::new(dir.path().join("data"), end());
    let entries = universe.eligible(&cfg.universe);
    assert_eq!(entries.len(), 2);
    let (inputs, skipped) = load_inputs(&entries, &opts, &cfg);
    assert_eq!(inputs.len(), 1);
    assert_eq!(skipped, 1);
    assert_eq!(inputs[0].entry.code, "AAA");
}

#[test]
fn single_symbol_evaluation_reads_supply_snapshot() {
    let (dir, _) = fixture();
    let supply_path = dir.path().join("supply.csv");
    std::fs::write(
        &supply_path,
        "code,foreign_consecutive_buy,inst_consecutive_buy,foreign_net_buy_5d,inst_net_buy_5d\n\
         AAA,5,2,1e9,1e9\n",
    )
    .unwrap();
    let supply = load_supply(&supply_path).unwrap();
    let cfg = ScanConfig::default();
    let opts = LoadOptions::new(dir.path().join("data"), end());

    let with = evaluate_symbol("AAA", &opts, &cfg, None, &supply).unwrap().unwrap();
    assert_eq!(with.supply_score, Some(15));

    let without = evaluate_symbol("AAA", &opts, &cfg, None, &HashMap::new())
        .unwrap()
        .unwrap();
    assert_eq!(without.supply_score, None);
    assert_eq!(with.total_score, without.total_score + 15);

    // a symbol missing from the snapshot file scores without supply
    let bbb = evaluate_symbol("BBB", &opts, &cfg, None, &supply).unwrap().unwrap();
    assert_eq!(bbb.supply_score, None);

    assert!(matches!(
        evaluate_symbol("SHORT", &opts, &cfg, None, &supply).unwrap(),
        Err(Rejection::InsufficientHistory { bars: 60, .. })
    ));
    assert!(matches!(
        evaluate_symbol("MISSING", &opts, &cfg, None, &supply),
        Err(LoadError::NotFound { .. })
    ));
}
