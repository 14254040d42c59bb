//! Curve validator - instrument metadata checks ahead of any history fetch

use crate::cache::ReferenceCache;
use crate::config::PairCurveSpec;
use crate::currency::{Currency, CurrencyPair, QuotationDirection};
use crate::error::{FxCurveError, Result};
use crate::types::{fields, ReferenceValue};
use hashbrown::HashMap;

/// What an instrument is expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Spot,
    Forward,
}

impl InstrumentKind {
    /// Whether a security-type description denotes this kind
    pub fn matches(&self, security_type: &str) -> bool {
        let normalized = security_type.trim().to_uppercase();
        match self {
            InstrumentKind::Forward => {
                normalized.contains("FORWARD") || normalized.contains("FWD")
            }
            InstrumentKind::Spot => {
                normalized.contains("SPOT")
                    && !normalized.contains("FORWARD")
                    && !normalized.contains("FWD")
            }
        }
    }
}

/// Checks that tickers really quote the pair they are configured for.
///
/// Uses two reference fields: the quotation base currency, which must be the
/// currency priced under the pair's [`QuotationDirection`], and the security
/// type, which must match the expected [`InstrumentKind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveValidator;

impl CurveValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a single forward ticker against `pair`
    pub fn validate(
        &self,
        reference: &mut ReferenceCache,
        ticker: &str,
        pair: &CurrencyPair,
        direction: QuotationDirection,
    ) -> Result<()> {
        self.validate_tickers(reference, &[(ticker, InstrumentKind::Forward)], pair, direction)
    }

    /// Validate the spot ticker and every forward ticker of a curve.
    /// Reference data for all of them is requested in one batch.
    pub fn validate_curve(
        &self,
        reference: &mut ReferenceCache,
        pair: &CurrencyPair,
        spec: &PairCurveSpec,
    ) -> Result<()> {
        let tickers: Vec<(&str, InstrumentKind)> =
            std::iter::once((spec.spot.as_str(), InstrumentKind::Spot))
                .chain(
                    spec.forwards
                        .values()
                        .map(|t| (t.as_str(), InstrumentKind::Forward)),
                )
                .collect();
        self.validate_tickers(reference, &tickers, pair, spec.direction)
    }

    fn validate_tickers(
        &self,
        reference: &mut ReferenceCache,
        tickers: &[(&str, InstrumentKind)],
        pair: &CurrencyPair,
        direction: QuotationDirection,
    ) -> Result<()> {
        let instruments: Vec<&str> = tickers.iter().map(|(t, _)| *t).collect();
        let values = reference.get_many(
            &instruments,
            &[fields::BASE_CURRENCY, fields::SECURITY_TYPE],
        )?;

        let expected = direction.priced_currency(pair);
        for (ticker, kind) in tickers {
            check_ticker(&values, ticker, *kind, expected, pair, direction)?;
        }
        log::debug!("Validated {} ticker(s) for {}", tickers.len(), pair);
        Ok(())
    }
}

fn text_field<'a>(
    values: &'a HashMap<(String, String), ReferenceValue>,
    ticker: &str,
    field: &str,
) -> Result<&'a str> {
    values
        .get(&(ticker.to_string(), field.to_string()))
        .and_then(ReferenceValue::as_text)
        .ok_or_else(|| FxCurveError::validation(ticker, format!("{} is not a text field", field)))
}

fn check_ticker(
    values: &HashMap<(String, String), ReferenceValue>,
    ticker: &str,
    kind: InstrumentKind,
    expected: Currency,
    pair: &CurrencyPair,
    direction: QuotationDirection,
) -> Result<()> {
    let base = text_field(values, ticker, fields::BASE_CURRENCY)?;
    let base: Currency = base.parse().map_err(|_| {
        FxCurveError::validation(ticker, format!("unrecognised base currency '{}'", base))
    })?;
    if base != expected {
        return Err(FxCurveError::validation(
            ticker,
            format!(
                "quoted in units of {} but {} {} quotation prices {}",
                base, pair, direction, expected
            ),
        ));
    }

    let security_type = text_field(values, ticker, fields::SECURITY_TYPE)?;
    if !kind.matches(security_type) {
        return Err(FxCurveError::validation(
            ticker,
            format!("security type '{}' is not {:?}", security_type, kind),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ReferenceStore;
    use crate::source::InMemorySource;
    use std::sync::Arc;

    fn cache_with(source: InMemorySource) -> ReferenceCache {
        ReferenceCache::new(Arc::new(source), ReferenceStore::open_in_memory().unwrap())
    }

    fn eurusd() -> CurrencyPair {
        CurrencyPair::new(Currency::EUR, Currency::USD)
    }

    #[test]
    fn test_instrument_kind_matching() {
        assert!(InstrumentKind::Forward.matches("FX FORWARD"));
        assert!(InstrumentKind::Forward.matches("fwd points"));
        assert!(InstrumentKind::Spot.matches("SPOT"));
        assert!(!InstrumentKind::Spot.matches("FX FORWARD"));
        assert!(!InstrumentKind::Forward.matches("SPOT"));
    }

    #[test]
    fn test_valid_forward_ticker() {
        let mut source = InMemorySource::new();
        source
            .add_reference("EUR1M Curncy", fields::BASE_CURRENCY, "EUR")
            .add_reference("EUR1M Curncy", fields::SECURITY_TYPE, "FX FORWARD");
        let mut cache = cache_with(source);

        CurveValidator::new()
            .validate(&mut cache, "EUR1M Curncy", &eurusd(), QuotationDirection::Direct)
            .unwrap();
    }

    #[test]
    fn test_direction_mismatch() {
        let mut source = InMemorySource::new();
        source
            .add_reference("EUR1M Curncy", fields::BASE_CURRENCY, "EUR")
            .add_reference("EUR1M Curncy", fields::SECURITY_TYPE, "FX FORWARD");
        let mut cache = cache_with(source);

        let err = CurveValidator::new()
            .validate(&mut cache, "EUR1M Curncy", &eurusd(), QuotationDirection::Indirect)
            .unwrap_err();
        assert!(matches!(err, FxCurveError::Validation { .. }));
        assert!(err.to_string().contains("USD"));
    }

    #[test]
    fn test_spot_ticker_configured_as_forward() {
        let mut source = InMemorySource::new();
        source
            .add_reference("EUR Curncy", fields::BASE_CURRENCY, "EUR")
            .add_reference("EUR Curncy", fields::SECURITY_TYPE, "SPOT");
        let mut cache = cache_with(source);

        let err = CurveValidator::new()
            .validate(&mut cache, "EUR Curncy", &eurusd(), QuotationDirection::Direct)
            .unwrap_err();
        assert!(err.to_string().contains("SPOT"));
    }

    #[test]
    fn test_missing_metadata_is_data_unavailable() {
        let mut cache = cache_with(InMemorySource::new());
        let err = CurveValidator::new()
            .validate(&mut cache, "EUR1M Curncy", &eurusd(), QuotationDirection::Direct)
            .unwrap_err();
        assert!(matches!(err, FxCurveError::DataUnavailable(_)));
    }
}
