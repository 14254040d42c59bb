//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rusty_fxcurve::prelude::*;

pub const EUR_SPOT: &str = "EUR Curncy";
pub const EUR_1M: &str = "EUR1M Curncy";
pub const EUR_3M: &str = "EUR3M Curncy";
pub const JPY_SPOT: &str = "JPY Curncy";
pub const JPY_3M: &str = "JPY3M Curncy";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Monday-to-Friday dates in `[start, end]`
pub fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(current);
        }
        current += Duration::days(1);
    }
    days
}

/// Deterministic value for a date, so repeated fetches agree
pub fn value_for(base: f64, day: NaiveDate) -> f64 {
    base + day.ordinal() as f64 / 10_000.0
}

pub const CURVES_TOML: &str = r#"
[pairs.EURUSD]
spot = "EUR Curncy"
direction = "direct"

[pairs.EURUSD.forwards]
1M = "EUR1M Curncy"
3M = "EUR3M Curncy"

[pairs.USDJPY]
spot = "JPY Curncy"
direction = "indirect"

[pairs.USDJPY.forwards]
3M = "JPY3M Curncy"
"#;

pub fn curves() -> CurveConfig {
    CurveConfig::from_toml_str(CURVES_TOML).unwrap()
}

pub fn eurusd() -> CurrencyPair {
    CurrencyPair::new(Currency::EUR, Currency::USD)
}

pub fn usdjpy() -> CurrencyPair {
    CurrencyPair::new(Currency::USD, Currency::JPY)
}

/// Source with reference data for both pairs and weekday history for 2024
pub fn market() -> InMemorySource {
    let mut source = InMemorySource::new();
    source
        .add_reference(EUR_SPOT, fields::BASE_CURRENCY, "EUR")
        .add_reference(EUR_SPOT, fields::SECURITY_TYPE, "SPOT")
        .add_reference(EUR_1M, fields::BASE_CURRENCY, "EUR")
        .add_reference(EUR_1M, fields::SECURITY_TYPE, "FX FORWARD")
        .add_reference(EUR_1M, fields::FWD_SCALE, 4.0)
        .add_reference(EUR_3M, fields::BASE_CURRENCY, "EUR")
        .add_reference(EUR_3M, fields::SECURITY_TYPE, "FX FORWARD")
        .add_reference(EUR_3M, fields::FWD_SCALE, 4.0)
        .add_reference(JPY_SPOT, fields::BASE_CURRENCY, "JPY")
        .add_reference(JPY_SPOT, fields::SECURITY_TYPE, "SPOT")
        .add_reference(JPY_3M, fields::BASE_CURRENCY, "JPY")
        .add_reference(JPY_3M, fields::SECURITY_TYPE, "FX FORWARD")
        .add_reference(JPY_3M, fields::FWD_SCALE, 2.0);

    let days = weekdays(date(2024, 1, 1), date(2024, 12, 31));
    let series = |base: f64| days.iter().map(move |d| (*d, value_for(base, *d)));
    source
        .add_series(EUR_SPOT, fields::LAST_PRICE, Periodicity::Daily, series(1.0800))
        .add_series(EUR_1M, fields::LAST_PRICE, Periodicity::Daily, series(25.0))
        .add_series(EUR_3M, fields::LAST_PRICE, Periodicity::Daily, series(75.0))
        .add_series(JPY_SPOT, fields::LAST_PRICE, Periodicity::Daily, series(145.00))
        .add_series(JPY_3M, fields::LAST_PRICE, Periodicity::Daily, series(-180.0));
    source
}
