//! ScanLab CLI — scan, merge, evaluate and config commands.
//!
//! Commands:
//! - `scan` — score a universe (or one chunk of it) and write ranked CSV
//! - `merge` — combine chunk files for a date into the dated and latest files
//! - `evaluate` — score a single symbol and print the record as JSON
//! - `init-config` — print the default TOML configuration

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use scanlab_core::{RunMode, ScanConfig};
use scanlab_runner::export::write_json;
use scanlab_runner::universe::chunk;
use scanlab_runner::{
    evaluate_symbol, load_inputs, load_supply, merge_partials, scan, write_run_output,
    LoadOptions, ScanReport, Universe,
};

#[derive(Parser)]
#[command(
    name = "scanlab",
    about = "ScanLab CLI — equity tradeability scanner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    EndOfDay,
    RealTime,
}

impl From<ModeArg> for RunMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::EndOfDay => RunMode::EndOfDay,
            ModeArg::RealTime => RunMode::RealTime,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score every symbol of a universe and write ranked results.
    Scan {
        /// Path to a TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of `<CODE>.csv` bar files.
        #[arg(long, default_value = "data/prices")]
        data_dir: PathBuf,

        /// Universe TOML (`[[stock]]` entries).
        #[arg(long)]
        universe: PathBuf,

        /// Optional investor-flow snapshot CSV.
        #[arg(long)]
        supply: Option<PathBuf>,

        /// 1-based chunk to scan. Without it the whole universe is scanned.
        #[arg(long)]
        chunk: Option<usize>,

        /// Entries per chunk.
        #[arg(long, default_value_t = 500)]
        chunk_size: usize,

        /// Only the first N entries by market cap are considered.
        #[arg(long, default_value_t = 1000)]
        top: usize,

        /// Run date used in output file names (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Override the configured run mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Use synthetic data for symbols without a CSV file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Output directory.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        /// Also write the full report as JSON next to the CSV.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Merge chunk files for a date into the dated and latest result files.
    Merge {
        /// Output directory holding `partial/`.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Score one symbol and print the record.
    Evaluate {
        /// Symbol code (`<data-dir>/<SYMBOL>.csv`).
        #[arg(long)]
        symbol: String,

        /// Directory of `<CODE>.csv` bar files.
        #[arg(long, default_value = "data/prices")]
        data_dir: PathBuf,

        /// Path to a TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Market cap, enabling the turnover gate.
        #[arg(long)]
        market_cap: Option<f64>,

        /// Optional investor-flow snapshot CSV; the symbol's row feeds the supply score.
        #[arg(long)]
        supply: Option<PathBuf>,

        /// Use synthetic data if no CSV exists.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Print the default configuration as TOML.
    InitConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            data_dir,
            universe,
            supply,
            chunk,
            chunk_size,
            top,
            date,
            mode,
            synthetic,
            output_dir,
            json,
        } => run_scan(ScanArgs {
            config,
            data_dir,
            universe,
            supply,
            chunk,
            chunk_size,
            top,
            date,
            mode,
            synthetic,
            output_dir,
            json,
        }),
        Commands::Merge { output_dir, date } => run_merge(&output_dir, date.as_deref()),
        Commands::Evaluate {
            symbol,
            data_dir,
            config,
            market_cap,
            supply,
            synthetic,
        } => run_evaluate(EvaluateArgs {
            symbol,
            data_dir,
            config,
            market_cap,
            supply,
            synthetic,
        }),
        Commands::InitConfig => {
            print!("{}", ScanConfig::default().to_toml()?);
            Ok(())
        }
    }
}

struct ScanArgs {
    config: Option<PathBuf>,
    data_dir: PathBuf,
    universe: PathBuf,
    supply: Option<PathBuf>,
    chunk: Option<usize>,
    chunk_size: usize,
    top: usize,
    date: Option<String>,
    mode: Option<ModeArg>,
    synthetic: bool,
    output_dir: PathBuf,
    json: bool,
}

struct EvaluateArgs {
    symbol: String,
    data_dir: PathBuf,
    config: Option<PathBuf>,
    market_cap: Option<f64>,
    supply: Option<PathBuf>,
    synthetic: bool,
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(p) => Ok(ScanConfig::from_file(p)?),
        None => Ok(ScanConfig::default()),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.run_mode = mode.into();
    }
    let date = parse_date(args.date.as_deref())?;

    let universe = Universe::from_file(&args.universe)?;
    let mut entries = universe.eligible(&config.universe);
    entries.truncate(args.top);
    let selected = match args.chunk {
        Some(n) => {
            if args.chunk_size == 0 {
                bail!("--chunk-size must be >= 1");
            }
            let part = chunk(&entries, n, args.chunk_size);
            if part.is_empty() {
                bail!(
                    "chunk {n} is empty ({} eligible entries, chunk size {})",
                    entries.len(),
                    args.chunk_size
                );
            }
            part
        }
        None => &entries[..],
    };
    info!(
        selected = selected.len(),
        universe = universe.len(),
        run_mode = ?config.run_mode,
        "scanning universe entries"
    );

    let supply = match &args.supply {
        Some(path) => load_supply(path)?,
        None => HashMap::new(),
    };

    let mut opts = LoadOptions::new(&args.data_dir, date);
    opts.synthetic = args.synthetic;
    let (inputs, skipped) = load_inputs(selected, &opts, &config);
    let report = scan(&inputs, &supply, &config, skipped);

    let path = write_run_output(&args.output_dir, date, args.chunk, &report.rows)?;
    if args.json {
        write_json(&path.with_extension("json"), &report)?;
    }

    print_summary(&report);
    println!("Results saved to: {}", path.display());
    Ok(())
}

fn print_summary(report: &ScanReport) {
    println!(
        "evaluated {} | accepted {} | not applicable {} | skipped {}",
        report.evaluated,
        report.accepted(),
        report.rejected,
        report.skipped
    );
    println!("config {}", &report.config_fingerprint[..12.min(report.config_fingerprint.len())]);
    if report.has_synthetic() {
        println!("WARNING: some rows were scored on synthetic data");
    }
    for row in report.rows.iter().take(10) {
        println!(
            "{:>3} {:<10} {:<20} setup {:<8} stop {:>10.0} risk {:>5.2}%",
            row.total_score,
            row.code,
            row.name,
            row.setup.label(),
            row.stop,
            row.risk_pct
        );
    }
}

fn run_merge(output_dir: &Path, date: Option<&str>) -> Result<()> {
    let date = parse_date(date)?;
    let summary = merge_partials(output_dir, date)?;
    println!(
        "merged {} files: {} rows ({} duplicates dropped) -> {}",
        summary.files,
        summary.rows,
        summary.duplicates,
        summary.output.display()
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut opts = LoadOptions::new(args.data_dir, chrono::Local::now().date_naive());
    opts.synthetic = args.synthetic;

    let supply = match &args.supply {
        Some(path) => load_supply(path)?,
        None => HashMap::new(),
    };

    match evaluate_symbol(&args.symbol, &opts, &config, args.market_cap, &supply)? {
        Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        Err(reason) => println!("{}: not applicable ({reason})", args.symbol),
    }
    Ok(())
}
