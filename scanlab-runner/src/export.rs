//! Result export — CSV and JSON files, chunk naming and partial-file merging.
//!
//! A chunked run writes `partial/scanner_output_{date}_chunk{n}.csv`; a merge
//! combines every chunk for a date into `scanner_output_{date}.csv` and
//! refreshes `scanner_output_latest.csv`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::scan::{sort_rows, ScanReport, ScanRow};

pub const LATEST_FILE: &str = "scanner_output_latest.csv";
pub const PARTIAL_DIR: &str = "partial";

pub fn partial_file_name(date: NaiveDate, chunk: usize) -> String {
    format!("scanner_output_{date}_chunk{chunk}.csv")
}

pub fn full_file_name(date: NaiveDate) -> String {
    format!("scanner_output_{date}.csv")
}

/// Chunk number encoded in a partial file name for `date`, if it is one.
pub fn parse_chunk_number(file_name: &str, date: NaiveDate) -> Option<usize> {
    file_name
        .strip_prefix(&format!("scanner_output_{date}_chunk"))?
        .strip_suffix(".csv")?
        .parse()
        .ok()
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Serialize rows to CSV text with a header row.
pub fn rows_to_csv(rows: &[ScanRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("failed to serialize row for {}", row.code))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_csv(path: &Path, rows: &[ScanRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let text = rows_to_csv(rows)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

pub fn read_csv(path: &Path) -> Result<Vec<ScanRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<ScanRow>, _>>()
        .with_context(|| format!("failed to parse {}", path.display()))
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScanReport to JSON")
}

pub fn write_json(path: &Path, report: &ScanReport) -> Result<()> {
    let json = export_json(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Run output ─────────────────────────────────────────────────────

/// Write the rows of one run. A chunked run goes to the partial directory;
/// an unchunked run writes the dated file and the latest file directly.
/// Returns the path of the dated or partial file.
pub fn write_run_output(
    output_dir: &Path,
    date: NaiveDate,
    chunk: Option<usize>,
    rows: &[ScanRow],
) -> Result<PathBuf> {
    match chunk {
        Some(n) => {
            let path = output_dir.join(PARTIAL_DIR).join(partial_file_name(date, n));
            write_csv(&path, rows)?;
            Ok(path)
        }
        None => {
            let path = output_dir.join(full_file_name(date));
            write_csv(&path, rows)?;
            write_csv(&output_dir.join(LATEST_FILE), rows)?;
            Ok(path)
        }
    }
}

/// What a merge did.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub files: usize,
    pub rows: usize,
    pub duplicates: usize,
    pub output: PathBuf,
}

/// Merge every chunk file for `date` under `output_dir/partial`.
///
/// Chunks are read in chunk order; when a code appears more than once the
/// first occurrence wins. The merged rows are re-ranked and written to the
/// dated file and the latest file.
pub fn merge_partials(output_dir: &Path, date: NaiveDate) -> Result<MergeSummary> {
    let partial_dir = output_dir.join(PARTIAL_DIR);
    let listing = std::fs::read_dir(&partial_dir)
        .with_context(|| format!("failed to list {}", partial_dir.display()))?;

    let mut chunks: Vec<(usize, PathBuf)> = Vec::new();
    for entry in listing {
        let entry = entry.with_context(|| format!("failed to list {}", partial_dir.display()))?;
        let name = entry.file_name();
        if let Some(n) = name.to_str().and_then(|s| parse_chunk_number(s, date)) {
            chunks.push((n, entry.path()));
        }
    }
    if chunks.is_empty() {
        bail!(
            "no partial files for {date} in {}",
            partial_dir.display()
        );
    }
    chunks.sort();

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut duplicates = 0usize;
    for (_, path) in &chunks {
        for row in read_csv(path)? {
            if seen.insert(row.code.clone()) {
                rows.push(row);
            } else {
                duplicates += 1;
            }
        }
    }
    sort_rows(&mut rows);

    let output = output_dir.join(full_file_name(date));
    write_csv(&output, &rows)?;
    write_csv(&output_dir.join(LATEST_FILE), &rows)?;
    info!(
        files = chunks.len(),
        rows = rows.len(),
        duplicates,
        output = %output.display(),
        "merged partial results"
    );

    Ok(MergeSummary {
        files: chunks.len(),
        rows: rows.len(),
        duplicates,
        output,
    })
}
