//! Investor-flow snapshots loaded from CSV, keyed by symbol code.
//!
//! Columns: `code, foreign_consecutive_buy, inst_consecutive_buy,
//! foreign_net_buy_5d, inst_net_buy_5d`. A symbol missing from the file has
//! no snapshot, which scores differently from a snapshot of zeros.

use scanlab_core::domain::SupplySnapshot;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::data_loader::LoadError;

#[derive(Debug, Deserialize)]
struct SupplyRow {
    code: String,
    #[serde(default)]
    foreign_consecutive_buy: u32,
    #[serde(default)]
    inst_consecutive_buy: u32,
    #[serde(default)]
    foreign_net_buy_5d: f64,
    #[serde(default)]
    inst_net_buy_5d: f64,
}

/// Load every snapshot in `path`. A later row for the same code replaces an earlier one.
pub fn load_supply(path: &Path) -> Result<HashMap<String, SupplySnapshot>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut out = HashMap::new();
    for row in reader.deserialize::<SupplyRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        out.insert(
            row.code,
            SupplySnapshot {
                foreign_consecutive_buy: row.foreign_consecutive_buy,
                inst_consecutive_buy: row.inst_consecutive_buy,
                foreign_net_buy_5d: row.foreign_net_buy_5d,
                inst_net_buy_5d: row.inst_net_buy_5d,
            },
        );
    }
    Ok(out)
}
