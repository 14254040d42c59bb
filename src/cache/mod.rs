//! Persistent caches in front of the market-data source
//!
//! # Components
//!
//! - **store**: SQLite-backed reference and history stores
//! - **reference**: point-in-time fields with a freshness window
//! - **history**: time series grown incrementally at their boundaries

pub mod history;
pub mod reference;
pub mod store;

pub use history::{HistoryCache, HistoryCacheStats, HistorySeries, HistorySlice, PartialCoverage, SeriesKey};
pub use reference::ReferenceCache;
pub use store::{HistoryStore, ReferenceRecord, ReferenceStore};
