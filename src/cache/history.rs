//! History cache - incrementally extended time series
//!
//! Each [`SeriesKey`] owns one [`HistorySeries`]: the observations fetched so
//! far and the contiguous interval `[covered_start, covered_end]` known to be
//! complete. A request inside that interval is answered locally. A request
//! reaching past it fetches only the missing boundary ranges, prefix before
//! suffix, and merges them in. Interior dates are never fetched twice and
//! cached values are never overwritten, so the upstream series is assumed
//! not to restate history.

use super::store::HistoryStore;
use crate::error::{FxCurveError, Result};
use crate::source::{MarketDataSource, Observations};
use crate::types::Periodicity;
use chrono::{Duration, NaiveDate};
use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cache key: periodicity is part of identity, so daily and weekly series of
/// the same instrument field never merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub instrument: String,
    pub field: String,
    pub periodicity: Periodicity,
}

impl SeriesKey {
    pub fn new(instrument: &str, field: &str, periodicity: Periodicity) -> Self {
        Self {
            instrument: instrument.to_string(),
            field: field.to_string(),
            periodicity,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.instrument, self.field, self.periodicity)
    }
}

/// Cached series for one key. Treated as a value: extension builds a new
/// series rather than mutating the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    key: SeriesKey,
    observations: Observations,
    covered_start: NaiveDate,
    covered_end: NaiveDate,
}

impl HistorySeries {
    pub(crate) fn from_parts(
        key: SeriesKey,
        observations: Observations,
        covered_start: NaiveDate,
        covered_end: NaiveDate,
    ) -> Self {
        Self {
            key,
            observations,
            covered_start,
            covered_end,
        }
    }

    /// First series for a key; coverage spans exactly the data received.
    /// Returns `None` when nothing was received.
    fn initial(key: SeriesKey, fetched: Observations) -> Option<Self> {
        let start = *fetched.keys().next()?;
        let end = *fetched.keys().next_back()?;
        Some(Self::from_parts(key, fetched, start, end))
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn covered_start(&self) -> NaiveDate {
        self.covered_start
    }

    pub fn covered_end(&self) -> NaiveDate {
        self.covered_end
    }

    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.covered_start <= start && end <= self.covered_end
    }

    /// Cached observations within `[start, end]`
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Observations {
        if start > end {
            return Observations::new();
        }
        self.observations
            .range(start..=end)
            .map(|(date, value)| (*date, *value))
            .collect()
    }

    /// Ranges of `[start, end]` outside the covered interval, prefix first
    pub fn missing_ranges(&self, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
        let mut ranges = Vec::with_capacity(2);
        if start < self.covered_start {
            ranges.push((start, self.covered_start - Duration::days(1)));
        }
        if end > self.covered_end {
            ranges.push((self.covered_end + Duration::days(1), end));
        }
        ranges
    }

    /// New series with `fetched` merged in. Already-cached dates keep their
    /// value; coverage grows only as far as the fetched data reaches.
    fn extended(&self, fetched: &Observations) -> Self {
        let mut observations = self.observations.clone();
        for (date, value) in fetched {
            observations.entry(*date).or_insert(*value);
        }

        let mut covered_start = self.covered_start;
        let mut covered_end = self.covered_end;
        if let Some(first) = fetched.keys().next() {
            covered_start = covered_start.min(*first);
        }
        if let Some(last) = fetched.keys().next_back() {
            covered_end = covered_end.max(*last);
        }

        Self::from_parts(self.key.clone(), observations, covered_start, covered_end)
    }
}

/// Non-fatal notice that the source returned less than was asked for,
/// e.g. a range starting before the instrument existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialCoverage {
    pub key: SeriesKey,
    pub requested_start: NaiveDate,
    pub requested_end: NaiveDate,
    /// First and last date actually received, if any
    pub received: Option<(NaiveDate, NaiveDate)>,
}

impl fmt::Display for PartialCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.received {
            Some((first, last)) => write!(
                f,
                "{}: requested {}..{}, received {}..{}",
                self.key, self.requested_start, self.requested_end, first, last
            ),
            None => write!(
                f,
                "{}: requested {}..{}, received nothing",
                self.key, self.requested_start, self.requested_end
            ),
        }
    }
}

/// Which side of a fetched range faces unexplored territory
#[derive(Debug, Clone, Copy)]
enum Edge {
    Start,
    End,
    Both,
}

fn check_partial(
    key: &SeriesKey,
    start: NaiveDate,
    end: NaiveDate,
    fetched: &Observations,
    edge: Edge,
) -> Option<PartialCoverage> {
    let tolerance = key.periodicity.gap_tolerance();
    let received = fetched
        .keys()
        .next()
        .zip(fetched.keys().next_back())
        .map(|(first, last)| (*first, *last));

    let short = match received {
        None => end - start + Duration::days(1) > tolerance,
        Some((first, last)) => {
            let short_start = first - start > tolerance;
            let short_end = end - last > tolerance;
            match edge {
                Edge::Start => short_start,
                Edge::End => short_end,
                Edge::Both => short_start || short_end,
            }
        }
    };

    short.then(|| PartialCoverage {
        key: key.clone(),
        requested_start: start,
        requested_end: end,
        received,
    })
}

/// What [`HistoryCache::get`] hands back: a read-only copy of the requested
/// range plus any partial-coverage notices raised while filling it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySlice {
    pub key: SeriesKey,
    pub observations: Observations,
    pub partial: Vec<PartialCoverage>,
}

impl HistorySlice {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }
}

/// Counters for cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCacheStats {
    /// Requests answered without any remote call
    pub hits: usize,
    /// Requests for a key with nothing cached yet
    pub misses: usize,
    /// Requests that grew an existing series
    pub extensions: usize,
    /// Remote `fetch_history` calls issued
    pub remote_fetches: usize,
}

/// History cache over a persistent [`HistoryStore`]
///
/// Not internally synchronised: `get` takes `&mut self`, so concurrent use
/// needs an external lock held across the whole look-up/fetch/merge.
pub struct HistoryCache {
    source: Arc<dyn MarketDataSource>,
    store: HistoryStore,
    loaded: HashMap<SeriesKey, HistorySeries>,
    stats: HistoryCacheStats,
}

impl fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryCache")
            .field("source", &self.source.name())
            .field("loaded_series", &self.loaded.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl HistoryCache {
    pub fn new(source: Arc<dyn MarketDataSource>, store: HistoryStore) -> Self {
        Self {
            source,
            store,
            loaded: HashMap::new(),
            stats: HistoryCacheStats::default(),
        }
    }

    /// Observations of `key` over exactly `[start, end]`
    pub fn get(&mut self, key: &SeriesKey, start: NaiveDate, end: NaiveDate) -> Result<HistorySlice> {
        if start > end {
            return Err(FxCurveError::InvalidRange { start, end });
        }

        let mut partial = Vec::new();

        if !self.ensure_loaded(key)? {
            self.stats.misses += 1;
            let fetched = self.fetch(key, start, end)?;
            partial.extend(check_partial(key, start, end, &fetched, Edge::Both));

            match HistorySeries::initial(key.clone(), fetched.clone()) {
                Some(series) => {
                    self.store.save_extension(&series, &fetched)?;
                    log::debug!(
                        "Cached {} from {} to {}",
                        key,
                        series.covered_start(),
                        series.covered_end()
                    );
                    self.loaded.insert(key.clone(), series);
                }
                None => {
                    log::debug!("Source has no data for {} in {}..{}", key, start, end);
                }
            }
        } else {
            let missing = match self.loaded.get(key) {
                Some(series) => series.missing_ranges(start, end),
                None => Vec::new(),
            };

            if missing.is_empty() {
                self.stats.hits += 1;
                log::debug!("Cache hit for {} {}..{}", key, start, end);
            } else {
                self.stats.extensions += 1;
                for (from, to) in missing {
                    self.extend(key, from, to, &mut partial)?;
                }
            }
        }

        for notice in &partial {
            log::warn!("Partial coverage for {}", notice);
        }

        let observations = self
            .loaded
            .get(key)
            .map(|series| series.slice(start, end))
            .unwrap_or_default();

        Ok(HistorySlice {
            key: key.clone(),
            observations,
            partial,
        })
    }

    /// Covered interval currently cached for `key`
    pub fn coverage(&mut self, key: &SeriesKey) -> Result<Option<(NaiveDate, NaiveDate)>> {
        self.ensure_loaded(key)?;
        Ok(self
            .loaded
            .get(key)
            .map(|series| (series.covered_start(), series.covered_end())))
    }

    /// Every persisted key with its covered interval
    pub fn cached_keys(&self) -> Result<Vec<(SeriesKey, NaiveDate, NaiveDate)>> {
        self.store.coverage_all()
    }

    pub fn stats(&self) -> HistoryCacheStats {
        self.stats
    }

    /// Fetch one boundary range and fold it into the cached series.
    /// Each range commits on its own, so a later failure never rolls back
    /// data that was already confirmed.
    fn extend(
        &mut self,
        key: &SeriesKey,
        from: NaiveDate,
        to: NaiveDate,
        partial: &mut Vec<PartialCoverage>,
    ) -> Result<()> {
        let fetched = self.fetch(key, from, to)?;

        let Some(current) = self.loaded.get(key) else {
            return Ok(());
        };
        let edge = if to < current.covered_start() {
            Edge::Start
        } else {
            Edge::End
        };
        partial.extend(check_partial(key, from, to, &fetched, edge));

        if fetched.is_empty() {
            return Ok(());
        }

        let next = current.extended(&fetched);
        self.store.save_extension(&next, &fetched)?;
        log::debug!(
            "Extended {} to {}..{}",
            key,
            next.covered_start(),
            next.covered_end()
        );
        self.loaded.insert(key.clone(), next);
        Ok(())
    }

    fn fetch(&mut self, key: &SeriesKey, start: NaiveDate, end: NaiveDate) -> Result<Observations> {
        self.stats.remote_fetches += 1;
        log::info!(
            "Fetching {} {}..{} from {}",
            key,
            start,
            end,
            self.source.name()
        );

        let mut data = self.source.fetch_history(
            &[key.instrument.as_str()],
            &[key.field.as_str()],
            start,
            end,
            key.periodicity,
        )?;

        // Anything outside the asked-for range is not evidence of coverage
        let received = data
            .remove(&(key.instrument.clone(), key.field.clone()))
            .unwrap_or_default();
        let in_range: Observations = received
            .range(start..=end)
            .map(|(date, value)| (*date, *value))
            .collect();

        // A non-finite value is no observation; SQLite cannot hold it
        let total = in_range.len();
        let finite: Observations = in_range
            .into_iter()
            .filter(|(_, value)| value.is_finite())
            .collect();
        if finite.len() < total {
            log::warn!(
                "Discarded {} non-finite value(s) for {} in {}..{}",
                total - finite.len(),
                key,
                start,
                end
            );
        }
        Ok(finite)
    }

    /// Pull `key` from the store into memory if needed.
    /// Returns whether a series exists.
    fn ensure_loaded(&mut self, key: &SeriesKey) -> Result<bool> {
        if self.loaded.contains_key(key) {
            return Ok(true);
        }
        match self.store.load(key)? {
            Some(series) => {
                self.loaded.insert(key.clone(), series);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key() -> SeriesKey {
        SeriesKey::new("EUR Curncy", "PX_LAST", Periodicity::Daily)
    }

    fn series(start: u32, end: u32) -> HistorySeries {
        let obs: Observations = (start..=end).map(|d| (date(2024, 1, d), d as f64)).collect();
        HistorySeries::initial(key(), obs).unwrap()
    }

    #[test]
    fn test_initial_coverage_matches_data() {
        let s = series(3, 9);
        assert_eq!(s.covered_start(), date(2024, 1, 3));
        assert_eq!(s.covered_end(), date(2024, 1, 9));
        assert!(HistorySeries::initial(key(), Observations::new()).is_none());
    }

    #[test]
    fn test_missing_ranges() {
        let s = series(10, 20);
        assert!(s.missing_ranges(date(2024, 1, 12), date(2024, 1, 18)).is_empty());
        assert_eq!(
            s.missing_ranges(date(2024, 1, 5), date(2024, 1, 15)),
            vec![(date(2024, 1, 5), date(2024, 1, 9))]
        );
        assert_eq!(
            s.missing_ranges(date(2024, 1, 15), date(2024, 1, 25)),
            vec![(date(2024, 1, 21), date(2024, 1, 25))]
        );
        assert_eq!(
            s.missing_ranges(date(2024, 1, 1), date(2024, 1, 31)),
            vec![
                (date(2024, 1, 1), date(2024, 1, 9)),
                (date(2024, 1, 21), date(2024, 1, 31))
            ]
        );
    }

    #[test]
    fn test_extended_keeps_cached_values() {
        let s = series(10, 20);
        let fetched: Observations = [(date(2024, 1, 20), 99.0), (date(2024, 1, 21), 21.0)]
            .into_iter()
            .collect();
        let next = s.extended(&fetched);

        assert_eq!(next.observations()[&date(2024, 1, 20)], 20.0);
        assert_eq!(next.observations()[&date(2024, 1, 21)], 21.0);
        assert_eq!(next.covered_end(), date(2024, 1, 21));
        // The original value is untouched
        assert_eq!(s.covered_end(), date(2024, 1, 20));
    }

    #[test]
    fn test_slice_bounds() {
        let s = series(1, 31);
        let slice = s.slice(date(2024, 1, 5), date(2024, 1, 7));
        assert_eq!(slice.len(), 3);
        assert!(s.slice(date(2024, 1, 7), date(2024, 1, 5)).is_empty());
    }

    #[test]
    fn test_check_partial_ignores_weekend_edges() {
        // Saturday 2024-01-06 to Sunday 2024-01-14, data Mon 8th..Fri 12th
        let fetched: Observations = (8..=12).map(|d| (date(2024, 1, d), 1.0)).collect();
        assert!(check_partial(&key(), date(2024, 1, 6), date(2024, 1, 14), &fetched, Edge::Both).is_none());

        let empty_weekend = Observations::new();
        assert!(check_partial(&key(), date(2024, 1, 6), date(2024, 1, 7), &empty_weekend, Edge::Both).is_none());
    }

    #[test]
    fn test_check_partial_flags_inception() {
        let fetched: Observations = (20..=31).map(|d| (date(2024, 1, d), 1.0)).collect();
        let notice = check_partial(&key(), date(2024, 1, 1), date(2024, 1, 31), &fetched, Edge::Both)
            .unwrap();
        assert_eq!(notice.received, Some((date(2024, 1, 20), date(2024, 1, 31))));
        assert!(notice.to_string().contains("received 2024-01-20..2024-01-31"));

        // Only the outward edge matters for a suffix extension
        assert!(check_partial(&key(), date(2024, 1, 1), date(2024, 1, 31), &fetched, Edge::End).is_none());
    }
}
