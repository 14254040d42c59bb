//! Market-data source abstraction
//!
//! The remote API is metered, so everything above this trait works hard to
//! call it as rarely as possible. Implementations:
//! - [`InMemorySource`]: deterministic fixture data, counts every call;
//!   can be loaded from CSV files for offline use.

pub mod in_memory;

pub use in_memory::{HistoryRequest, InMemorySource};

use crate::error::Result;
use crate::types::{Periodicity, ReferenceValue};
use chrono::NaiveDate;
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Date-ordered observations of one instrument field
pub type Observations = BTreeMap<NaiveDate, f64>;

/// Reference response keyed by (instrument, field)
pub type ReferenceData = HashMap<(String, String), ReferenceValue>;

/// History response keyed by (instrument, field)
pub type HistoryData = HashMap<(String, String), Observations>;

/// Trait for the remote market-data API
///
/// Both calls are blocking. Transport failures surface as
/// [`FxCurveError::DataUnavailable`](crate::error::FxCurveError::DataUnavailable).
/// Pairs the source knows nothing about are simply absent from the response.
pub trait MarketDataSource: Send + Sync {
    /// Point-in-time fields for every requested instrument
    fn fetch_reference(&self, instruments: &[&str], fields: &[&str]) -> Result<ReferenceData>;

    /// Observations within `[start, end]` (inclusive) at `periodicity`
    fn fetch_history(
        &self,
        instruments: &[&str],
        fields: &[&str],
        start: NaiveDate,
        end: NaiveDate,
        periodicity: Periodicity,
    ) -> Result<HistoryData>;

    /// Get the source name
    fn name(&self) -> &str;
}
