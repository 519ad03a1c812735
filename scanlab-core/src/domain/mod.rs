//! Domain types for ScanLab

pub mod bar;
pub mod series;
pub mod supply;

pub use bar::Bar;
pub use series::{PriceSeries, SeriesError};
pub use supply::SupplySnapshot;
