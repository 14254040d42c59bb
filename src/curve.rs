//! Immutable forward curve handed to downstream carry/hedging code

use crate::cache::PartialCoverage;
use crate::currency::{CurrencyPair, QuotationDirection};
use crate::error::Result;
use crate::types::{Periodicity, Tenor};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// One date of a curve: spot and one forward rate per tenor, short to long
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveRow {
    pub date: NaiveDate,
    pub spot: f64,
    pub forwards: Vec<(Tenor, f64)>,
}

/// Date-indexed spot and forward rates for one currency pair.
///
/// Built only by [`CurveBuilder`](crate::builder::CurveBuilder) and never
/// mutated afterwards. Rates are stored as quoted; `direction` says how to
/// read them, the numbers are not inverted for indirect pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardCurve {
    pair: CurrencyPair,
    direction: QuotationDirection,
    periodicity: Periodicity,
    scale_factors: BTreeMap<Tenor, i32>,
    dates: Vec<NaiveDate>,
    spot: Vec<f64>,
    rates: BTreeMap<Tenor, Vec<f64>>,
    #[serde(skip)]
    warnings: Vec<PartialCoverage>,
}

impl ForwardCurve {
    /// Columns must all be as long as `dates`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        pair: CurrencyPair,
        direction: QuotationDirection,
        periodicity: Periodicity,
        scale_factors: BTreeMap<Tenor, i32>,
        dates: Vec<NaiveDate>,
        spot: Vec<f64>,
        rates: BTreeMap<Tenor, Vec<f64>>,
        warnings: Vec<PartialCoverage>,
    ) -> Self {
        debug_assert_eq!(dates.len(), spot.len());
        debug_assert!(rates.values().all(|column| column.len() == dates.len()));
        Self {
            pair,
            direction,
            periodicity,
            scale_factors,
            dates,
            spot,
            rates,
            warnings,
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        self.pair
    }

    pub fn direction(&self) -> QuotationDirection {
        self.direction
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Tenors present in the curve, short to long
    pub fn tenors(&self) -> impl Iterator<Item = Tenor> + '_ {
        self.rates.keys().copied()
    }

    pub fn scale_factor(&self, tenor: Tenor) -> Option<i32> {
        self.scale_factors.get(&tenor).copied()
    }

    pub fn scale_factors(&self) -> &BTreeMap<Tenor, i32> {
        &self.scale_factors
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Spot rates aligned with [`dates`](Self::dates)
    pub fn spot(&self) -> &[f64] {
        &self.spot
    }

    /// Forward rates for `tenor`, aligned with [`dates`](Self::dates)
    pub fn rates(&self, tenor: Tenor) -> Option<&[f64]> {
        self.rates.get(&tenor).map(Vec::as_slice)
    }

    /// Forward points recovered from the rates: `(rate - spot) * 10^scale`
    pub fn forward_points(&self, tenor: Tenor) -> Option<Vec<f64>> {
        let scale = 10f64.powi(self.scale_factor(tenor)?);
        let rates = self.rates(tenor)?;
        Some(
            rates
                .iter()
                .zip(&self.spot)
                .map(|(rate, spot)| (rate - spot) * scale)
                .collect(),
        )
    }

    /// Row for `date`, if the curve has one
    pub fn row(&self, date: NaiveDate) -> Option<CurveRow> {
        let idx = self.dates.binary_search(&date).ok()?;
        Some(CurveRow {
            date,
            spot: self.spot[idx],
            forwards: self
                .rates
                .iter()
                .map(|(tenor, column)| (*tenor, column[idx]))
                .collect(),
        })
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Partial-coverage notices raised while the inputs were fetched
    pub fn warnings(&self) -> &[PartialCoverage] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Write the table as CSV: `date,spot,<tenor>...`
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["date".to_string(), "spot".to_string()];
        header.extend(self.tenors().map(|t| t.to_string()));
        csv_writer.write_record(&header)?;

        for (idx, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.to_string(), self.spot[idx].to_string()];
            record.extend(self.rates.values().map(|column| column[idx].to_string()));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
