//! Curve builder - validated reference + history data into a [`ForwardCurve`]

use crate::cache::{
    HistoryCache, HistorySlice, HistoryStore, PartialCoverage, ReferenceCache, ReferenceStore,
    SeriesKey,
};
use crate::config::{CacheSettings, CurveConfig};
use crate::currency::CurrencyPair;
use crate::curve::ForwardCurve;
use crate::error::{FxCurveError, Result};
use crate::source::MarketDataSource;
use crate::types::{fields, Periodicity, ReferenceValue, Tenor};
use crate::validator::CurveValidator;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Largest power-of-ten scale accepted for forward points
const MAX_FWD_SCALE: i32 = 12;

/// `spot + points / 10^scale`
pub fn forward_rate(spot: f64, points: f64, scale: i32) -> f64 {
    spot + points / 10f64.powi(scale)
}

/// Assembles forward curves from the two caches.
///
/// A build either returns a complete curve or fails with the first fatal
/// error; there is never a curve with some tenors missing.
#[derive(Debug)]
pub struct CurveBuilder {
    reference: ReferenceCache,
    history: HistoryCache,
    validator: CurveValidator,
}

impl CurveBuilder {
    pub fn new(reference: ReferenceCache, history: HistoryCache) -> Self {
        Self {
            reference,
            history,
            validator: CurveValidator::new(),
        }
    }

    /// Builder over the SQLite cache described by `settings`
    pub fn open(source: Arc<dyn MarketDataSource>, settings: &CacheSettings) -> Result<Self> {
        let reference = ReferenceCache::with_ttl(
            source.clone(),
            ReferenceStore::open(&settings.db_path)?,
            settings.reference_ttl(),
        );
        let history = HistoryCache::new(source, HistoryStore::open(&settings.db_path)?);
        Ok(Self::new(reference, history))
    }

    /// Builder with throwaway in-memory caches
    pub fn in_memory(source: Arc<dyn MarketDataSource>) -> Result<Self> {
        let reference = ReferenceCache::new(source.clone(), ReferenceStore::open_in_memory()?);
        let history = HistoryCache::new(source, HistoryStore::open_in_memory()?);
        Ok(Self::new(reference, history))
    }

    /// Build the curve for `pair` over `[start, end]`
    pub fn build(
        &mut self,
        config: &CurveConfig,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
        periodicity: Periodicity,
    ) -> Result<ForwardCurve> {
        if start > end {
            return Err(FxCurveError::InvalidRange { start, end });
        }
        let spec = config.get(pair)?;

        // Nothing is fetched into the history cache under an unchecked ticker
        self.validator
            .validate_curve(&mut self.reference, pair, spec)?;

        let scale_factors = self.scale_factors(&spec.forwards)?;

        let mut warnings: Vec<PartialCoverage> = Vec::new();
        let spot = self.series(&spec.spot, start, end, periodicity)?;
        warnings.extend(spot.partial.iter().cloned());

        let mut points: BTreeMap<Tenor, HistorySlice> = BTreeMap::new();
        for (tenor, ticker) in &spec.forwards {
            let slice = self.series(ticker, start, end, periodicity)?;
            warnings.extend(slice.partial.iter().cloned());
            points.insert(*tenor, slice);
        }

        let mut dates = Vec::with_capacity(spot.len());
        let mut spot_column = Vec::with_capacity(spot.len());
        let mut rate_columns: BTreeMap<Tenor, Vec<f64>> = points
            .keys()
            .map(|tenor| (*tenor, Vec::with_capacity(spot.len())))
            .collect();
        let mut dropped = 0usize;

        for (date, spot_rate) in &spot.observations {
            let row: Option<Vec<(Tenor, f64)>> = points
                .iter()
                .map(|(tenor, slice)| {
                    slice
                        .observations
                        .get(date)
                        .map(|p| (*tenor, forward_rate(*spot_rate, *p, scale_factors[tenor])))
                })
                .collect();

            let Some(row) = row else {
                dropped += 1;
                continue;
            };
            dates.push(*date);
            spot_column.push(*spot_rate);
            for (tenor, rate) in row {
                if let Some(column) = rate_columns.get_mut(&tenor) {
                    column.push(rate);
                }
            }
        }

        if dropped > 0 {
            log::warn!(
                "{}: dropped {} date(s) lacking a forward observation for some tenor",
                pair,
                dropped
            );
        }
        if dates.is_empty() {
            return Err(FxCurveError::DataUnavailable(format!(
                "{}: no date in {}..{} has spot and every forward tenor",
                pair, start, end
            )));
        }

        log::info!(
            "Built {} curve: {} dates, {} tenors, {}..{}",
            pair,
            dates.len(),
            rate_columns.len(),
            dates[0],
            dates[dates.len() - 1]
        );

        Ok(ForwardCurve::new(
            *pair,
            spec.direction,
            periodicity,
            scale_factors,
            dates,
            spot_column,
            rate_columns,
            warnings,
        ))
    }

    /// Build several curves one after another; stops at the first failure
    pub fn build_many(
        &mut self,
        config: &CurveConfig,
        pairs: &[CurrencyPair],
        start: NaiveDate,
        end: NaiveDate,
        periodicity: Periodicity,
    ) -> Result<Vec<ForwardCurve>> {
        pairs
            .iter()
            .map(|pair| self.build(config, pair, start, end, periodicity))
            .collect()
    }

    pub fn reference_cache(&mut self) -> &mut ReferenceCache {
        &mut self.reference
    }

    pub fn history_cache(&mut self) -> &mut HistoryCache {
        &mut self.history
    }

    fn scale_factors(&mut self, forwards: &BTreeMap<Tenor, String>) -> Result<BTreeMap<Tenor, i32>> {
        let tickers: Vec<&str> = forwards.values().map(String::as_str).collect();
        let values = self.reference.get_many(&tickers, &[fields::FWD_SCALE])?;

        forwards
            .iter()
            .map(|(tenor, ticker)| {
                let value = values
                    .get(&(ticker.clone(), fields::FWD_SCALE.to_string()))
                    .ok_or_else(|| {
                        FxCurveError::DataUnavailable(format!("{} has no {}", ticker, fields::FWD_SCALE))
                    })?;
                Ok((*tenor, parse_scale(ticker, value)?))
            })
            .collect()
    }

    fn series(
        &mut self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        periodicity: Periodicity,
    ) -> Result<HistorySlice> {
        let key = SeriesKey::new(ticker, fields::LAST_PRICE, periodicity);
        let slice = self.history.get(&key, start, end)?;
        if slice.is_empty() {
            return Err(FxCurveError::DataUnavailable(format!(
                "No {} history for {} in {}..{}",
                periodicity, key, start, end
            )));
        }
        Ok(slice)
    }
}

fn parse_scale(ticker: &str, value: &ReferenceValue) -> Result<i32> {
    let raw = value.as_f64().ok_or_else(|| {
        FxCurveError::validation(ticker, format!("{} '{}' is not numeric", fields::FWD_SCALE, value))
    })?;
    if raw.fract() != 0.0 || raw < 0.0 || raw > MAX_FWD_SCALE as f64 {
        return Err(FxCurveError::validation(
            ticker,
            format!("{} {} is not an integer in 0..={}", fields::FWD_SCALE, raw, MAX_FWD_SCALE),
        ));
    }
    Ok(raw as i32)
}
