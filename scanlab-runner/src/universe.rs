//! Scan universe: the list of symbols to evaluate, plus pre-filters and chunking.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [[stock]]
//! code = "005930"
//! name = "Samsung Electronics"
//! sector = "Semiconductors"
//! market_cap = 4.3e14
//! ```

use scanlab_core::config::UniverseFilter;
use scanlab_core::domain::PriceSeries;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to read universe {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse universe: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate code '{0}' in universe")]
    DuplicateCode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl UniverseEntry {
    pub fn sector_or_default(&self) -> &str {
        self.sector.as_deref().unwrap_or("other")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default, rename = "stock")]
    entries: Vec<UniverseEntry>,
}

impl Universe {
    pub fn new(entries: Vec<UniverseEntry>) -> Self {
        Self { entries }
    }

    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let universe: Self = toml::from_str(content)?;
        let mut seen = std::collections::HashSet::new();
        for e in &universe.entries {
            if !seen.insert(e.code.as_str()) {
                return Err(UniverseError::DuplicateCode(e.code.clone()));
            }
        }
        Ok(universe)
    }

    pub fn entries(&self) -> &[UniverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries passing the market-cap floor, largest cap first.
    ///
    /// Entries without a known cap are kept (after every capped entry) unless
    /// a floor is configured. Ties keep file order.
    pub fn eligible(&self, filter: &UniverseFilter) -> Vec<UniverseEntry> {
        let mut out: Vec<UniverseEntry> = self
            .entries
            .iter()
            .filter(|e| match (filter.min_mktcap, e.market_cap) {
                (Some(floor), Some(cap)) => cap >= floor,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            let a = a.market_cap.unwrap_or(f64::NEG_INFINITY);
            let b = b.market_cap.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        out
    }
}

/// The 1-based `index`-th chunk of `size` entries. Out-of-range chunks are empty.
pub fn chunk<T>(entries: &[T], index: usize, size: usize) -> &[T] {
    if index == 0 || size == 0 {
        return &[];
    }
    let start = (index - 1).saturating_mul(size).min(entries.len());
    let end = start.saturating_add(size).min(entries.len());
    &entries[start..end]
}

/// Post-load price floor on the last close.
pub fn passes_min_close(series: &PriceSeries, filter: &UniverseFilter) -> bool {
    match (filter.min_close, series.last()) {
        (None, _) => true,
        (Some(floor), Some(bar)) => bar.close >= floor,
        (Some(_), None) => false,
    }
}
