use chrono::{Datelike, Duration, NaiveDate, Weekday};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rusty_fxcurve::cache::{HistoryCache, HistoryStore, SeriesKey};
use rusty_fxcurve::prelude::*;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn weekday_series(base: f64) -> Vec<(NaiveDate, f64)> {
    let mut days = Vec::new();
    let mut current = date(2020, 1, 1);
    while current <= date(2024, 12, 31) {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push((current, base + current.ordinal() as f64 / 10_000.0));
        }
        current += Duration::days(1);
    }
    days
}

fn market() -> InMemorySource {
    let mut source = InMemorySource::new();
    source
        .add_reference("EUR Curncy", fields::BASE_CURRENCY, "EUR")
        .add_reference("EUR Curncy", fields::SECURITY_TYPE, "SPOT")
        .add_reference("EUR1M Curncy", fields::BASE_CURRENCY, "EUR")
        .add_reference("EUR1M Curncy", fields::SECURITY_TYPE, "FX FORWARD")
        .add_reference("EUR1M Curncy", fields::FWD_SCALE, 4.0)
        .add_reference("EUR3M Curncy", fields::BASE_CURRENCY, "EUR")
        .add_reference("EUR3M Curncy", fields::SECURITY_TYPE, "FX FORWARD")
        .add_reference("EUR3M Curncy", fields::FWD_SCALE, 4.0)
        .add_series("EUR Curncy", fields::LAST_PRICE, Periodicity::Daily, weekday_series(1.08))
        .add_series("EUR1M Curncy", fields::LAST_PRICE, Periodicity::Daily, weekday_series(25.0))
        .add_series("EUR3M Curncy", fields::LAST_PRICE, Periodicity::Daily, weekday_series(75.0));
    source
}

fn benchmark_history_cache_hit(c: &mut Criterion) {
    let source: Arc<dyn MarketDataSource> = Arc::new(market());
    let mut cache = HistoryCache::new(source, HistoryStore::open_in_memory().unwrap());
    let key = SeriesKey::new("EUR Curncy", fields::LAST_PRICE, Periodicity::Daily);
    cache.get(&key, date(2020, 1, 1), date(2024, 12, 31)).unwrap();

    c.bench_function("history_cache_hit_1y", |b| {
        b.iter(|| {
            let slice = cache
                .get(black_box(&key), date(2023, 1, 1), date(2023, 12, 31))
                .unwrap();
            black_box(slice.len());
        });
    });
}

fn benchmark_cached_curve_build(c: &mut Criterion) {
    let config = CurveConfig::from_toml_str(
        r#"
[pairs.EURUSD]
spot = "EUR Curncy"
direction = "direct"

[pairs.EURUSD.forwards]
1M = "EUR1M Curncy"
3M = "EUR3M Curncy"
"#,
    )
    .unwrap();
    let pair = CurrencyPair::new(Currency::EUR, Currency::USD);
    let mut builder = CurveBuilder::in_memory(Arc::new(market())).unwrap();
    builder
        .build(&config, &pair, date(2020, 1, 1), date(2024, 12, 31), Periodicity::Daily)
        .unwrap();

    c.bench_function("cached_curve_build_5y", |b| {
        b.iter(|| {
            let curve = builder
                .build(&config, black_box(&pair), date(2020, 1, 1), date(2024, 12, 31), Periodicity::Daily)
                .unwrap();
            black_box(curve.len());
        });
    });
}

fn benchmark_forward_rate(c: &mut Criterion) {
    c.bench_function("forward_rate_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(forward_rate(black_box(1.08), black_box(i as f64), 4));
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_history_cache_hit,
    benchmark_cached_curve_build,
    benchmark_forward_rate
);
criterion_main!(benches);
