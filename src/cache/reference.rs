//! Reference cache - point-in-time fields with a freshness window

use super::store::{ReferenceRecord, ReferenceStore};
use crate::config::DEFAULT_REFERENCE_TTL_DAYS;
use crate::error::{FxCurveError, Result};
use crate::source::MarketDataSource;
use crate::types::ReferenceValue;
use chrono::{DateTime, Duration, Utc};
use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cache of small reference fields (scale factors, quotation conventions).
///
/// A record older than the freshness window counts as absent. All missing or
/// stale (instrument, field) pairs of one request go out in a single remote
/// call; whatever comes back is written through with a new `fetched_at`.
pub struct ReferenceCache {
    source: Arc<dyn MarketDataSource>,
    store: ReferenceStore,
    ttl: Duration,
    remote_calls: usize,
}

impl fmt::Debug for ReferenceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceCache")
            .field("source", &self.source.name())
            .field("ttl", &self.ttl)
            .field("remote_calls", &self.remote_calls)
            .finish()
    }
}

impl ReferenceCache {
    pub fn new(source: Arc<dyn MarketDataSource>, store: ReferenceStore) -> Self {
        Self::with_ttl(source, store, Duration::days(DEFAULT_REFERENCE_TTL_DAYS))
    }

    pub fn with_ttl(source: Arc<dyn MarketDataSource>, store: ReferenceStore, ttl: Duration) -> Self {
        Self {
            source,
            store,
            ttl,
            remote_calls: 0,
        }
    }

    /// Fields of one instrument, keyed by field name
    pub fn get(&mut self, instrument: &str, fields: &[&str]) -> Result<HashMap<String, ReferenceValue>> {
        self.get_at(instrument, fields, Utc::now())
    }

    /// [`get`](Self::get) evaluated at an explicit `now`
    pub fn get_at(
        &mut self,
        instrument: &str,
        fields: &[&str],
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, ReferenceValue>> {
        let values = self.get_many_at(&[instrument], fields, now)?;
        Ok(values
            .into_iter()
            .map(|((_, field), value)| (field, value))
            .collect())
    }

    /// Fields of several instruments, keyed by (instrument, field).
    /// Everything stale is refreshed with one remote call.
    pub fn get_many(
        &mut self,
        instruments: &[&str],
        fields: &[&str],
    ) -> Result<HashMap<(String, String), ReferenceValue>> {
        self.get_many_at(instruments, fields, Utc::now())
    }

    pub fn get_many_at(
        &mut self,
        instruments: &[&str],
        fields: &[&str],
        now: DateTime<Utc>,
    ) -> Result<HashMap<(String, String), ReferenceValue>> {
        let mut values = HashMap::new();
        let mut stale: Vec<(&str, &str)> = Vec::new();

        for &instrument in instruments {
            for &field in fields {
                match self.store.get(instrument, field)? {
                    Some(record) if record.is_fresh(now, self.ttl) => {
                        values.insert((instrument.to_string(), field.to_string()), record.value);
                    }
                    _ => {
                        if !stale.contains(&(instrument, field)) {
                            stale.push((instrument, field));
                        }
                    }
                }
            }
        }

        if stale.is_empty() {
            log::debug!(
                "Reference cache hit for {} instrument(s), {} field(s)",
                instruments.len(),
                fields.len()
            );
            return Ok(values);
        }

        let mut stale_instruments: Vec<&str> = Vec::new();
        let mut stale_fields: Vec<&str> = Vec::new();
        for (instrument, field) in &stale {
            if !stale_instruments.contains(instrument) {
                stale_instruments.push(*instrument);
            }
            if !stale_fields.contains(field) {
                stale_fields.push(*field);
            }
        }

        log::info!(
            "Fetching {} reference field(s) for {} instrument(s) from {}",
            stale.len(),
            stale_instruments.len(),
            self.source.name()
        );
        self.remote_calls += 1;
        let response = self.source.fetch_reference(&stale_instruments, &stale_fields)?;

        let mut records = Vec::with_capacity(stale.len());
        let mut missing = Vec::new();
        for (instrument, field) in stale {
            let key = (instrument.to_string(), field.to_string());
            // A non-finite number cannot round-trip through the store
            let usable = response.get(&key).filter(|value| match value {
                ReferenceValue::Number(n) => n.is_finite(),
                ReferenceValue::Text(_) => true,
            });
            match usable {
                Some(value) => {
                    records.push(ReferenceRecord {
                        instrument: key.0.clone(),
                        field: key.1.clone(),
                        value: value.clone(),
                        fetched_at: now,
                    });
                    values.insert(key, value.clone());
                }
                None => missing.push(format!("{} {}", instrument, field)),
            }
        }

        // Only values the source actually returned are written
        self.store.put_all(&records)?;

        if !missing.is_empty() {
            return Err(FxCurveError::DataUnavailable(format!(
                "Reference field(s) missing from response: {}",
                missing.join(", ")
            )));
        }

        Ok(values)
    }

    /// Forget every cached field of `instrument`
    pub fn invalidate(&mut self, instrument: &str) -> Result<usize> {
        self.store.remove_instrument(instrument)
    }

    /// Remote calls issued by this cache so far
    pub fn remote_calls(&self) -> usize {
        self.remote_calls
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
