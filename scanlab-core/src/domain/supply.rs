//! Investor flow snapshot supplied alongside a series.

use serde::{Deserialize, Serialize};

/// Foreign/institutional buying activity for one symbol as of the evaluation date.
///
/// Callers pass `Option<&SupplySnapshot>`; `None` means no data was available,
/// which is different from a snapshot with zero net flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplySnapshot {
    /// Consecutive trading days with foreign net buying, ending today.
    pub foreign_consecutive_buy: u32,
    /// Consecutive trading days with institutional net buying, ending today.
    pub inst_consecutive_buy: u32,
    /// Foreign net buy over the last 5 sessions (signed).
    pub foreign_net_buy_5d: f64,
    /// Institutional net buy over the last 5 sessions (signed).
    pub inst_net_buy_5d: f64,
}
