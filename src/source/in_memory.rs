//! In-memory market-data source
//!
//! Serves fixture data and records every call so tests can assert exactly how
//! often, and over which ranges, the caches went to the network.

use super::{HistoryData, MarketDataSource, Observations, ReferenceData};
use crate::error::{FxCurveError, Result};
use crate::types::{Periodicity, ReferenceValue};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded `fetch_history` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub instruments: Vec<String>,
    pub fields: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub periodicity: Periodicity,
}

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    instrument: String,
    field: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    instrument: String,
    field: String,
    periodicity: String,
    date: NaiveDate,
    value: f64,
}

/// Fixture-backed [`MarketDataSource`]
#[derive(Debug, Default)]
pub struct InMemorySource {
    reference: HashMap<(String, String), ReferenceValue>,
    history: HashMap<(String, String, Periodicity), Observations>,
    reference_calls: AtomicUsize,
    history_calls: AtomicUsize,
    history_log: Mutex<Vec<HistoryRequest>>,
    offline: AtomicBool,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a reference field
    pub fn add_reference(
        &mut self,
        instrument: &str,
        field: &str,
        value: impl Into<ReferenceValue>,
    ) -> &mut Self {
        self.reference
            .insert((instrument.to_string(), field.to_string()), value.into());
        self
    }

    /// Add or replace a single observation
    pub fn add_observation(
        &mut self,
        instrument: &str,
        field: &str,
        periodicity: Periodicity,
        date: NaiveDate,
        value: f64,
    ) -> &mut Self {
        self.history
            .entry((instrument.to_string(), field.to_string(), periodicity))
            .or_default()
            .insert(date, value);
        self
    }

    /// Add a whole series (batch insert)
    pub fn add_series(
        &mut self,
        instrument: &str,
        field: &str,
        periodicity: Periodicity,
        observations: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> &mut Self {
        self.history
            .entry((instrument.to_string(), field.to_string(), periodicity))
            .or_default()
            .extend(observations);
        self
    }

    /// Load reference fields from CSV
    ///
    /// Expected header: `instrument,field,value`. Numeric values are stored
    /// as numbers, everything else as text.
    pub fn load_reference_csv<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut count = 0;
        for row in csv_reader.deserialize() {
            let row: ReferenceRow = row?;
            let value = match row.value.trim().parse::<f64>() {
                Ok(n) => ReferenceValue::Number(n),
                Err(_) => ReferenceValue::Text(row.value.trim().to_string()),
            };
            self.add_reference(&row.instrument, &row.field, value);
            count += 1;
        }
        Ok(count)
    }

    /// Load observations from CSV
    ///
    /// Expected header: `instrument,field,periodicity,date,value` with ISO dates.
    pub fn load_history_csv<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut count = 0;
        for row in csv_reader.deserialize() {
            let row: HistoryRow = row?;
            let periodicity: Periodicity = row.periodicity.parse()?;
            self.add_observation(&row.instrument, &row.field, periodicity, row.date, row.value);
            count += 1;
        }
        Ok(count)
    }

    /// Load `reference.csv` and `history.csv` from a directory
    pub fn from_csv_dir(dir: &Path) -> Result<Self> {
        let mut source = Self::new();
        let reference = std::fs::File::open(dir.join("reference.csv"))?;
        let history = std::fs::File::open(dir.join("history.csv"))?;
        let refs = source.load_reference_csv(reference)?;
        let obs = source.load_history_csv(history)?;
        log::debug!(
            "Loaded {} reference fields and {} observations from {}",
            refs,
            obs,
            dir.display()
        );
        Ok(source)
    }

    /// Simulate a transport outage: every call fails while set
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn reference_calls(&self) -> usize {
        self.reference_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.reference_calls() + self.history_calls()
    }

    /// Every `fetch_history` call seen so far, oldest first
    pub fn history_requests(&self) -> Vec<HistoryRequest> {
        self.history_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FxCurveError::DataUnavailable(
                "in-memory source is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl MarketDataSource for InMemorySource {
    fn fetch_reference(&self, instruments: &[&str], fields: &[&str]) -> Result<ReferenceData> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let mut data = ReferenceData::new();
        for instrument in instruments {
            for field in fields {
                let key = (instrument.to_string(), field.to_string());
                if let Some(value) = self.reference.get(&key) {
                    data.insert(key, value.clone());
                }
            }
        }
        Ok(data)
    }

    fn fetch_history(
        &self,
        instruments: &[&str],
        fields: &[&str],
        start: NaiveDate,
        end: NaiveDate,
        periodicity: Periodicity,
    ) -> Result<HistoryData> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.history_log.lock() {
            log.push(HistoryRequest {
                instruments: instruments.iter().map(|s| s.to_string()).collect(),
                fields: fields.iter().map(|s| s.to_string()).collect(),
                start,
                end,
                periodicity,
            });
        }
        self.check_online()?;

        let mut data = HistoryData::new();
        if start > end {
            return Ok(data);
        }
        for instrument in instruments {
            for field in fields {
                let key = (instrument.to_string(), field.to_string(), periodicity);
                if let Some(series) = self.history.get(&key) {
                    let slice: Observations = series
                        .range(start..=end)
                        .map(|(date, value)| (*date, *value))
                        .collect();
                    if !slice.is_empty() {
                        data.insert((instrument.to_string(), field.to_string()), slice);
                    }
                }
            }
        }
        Ok(data)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
