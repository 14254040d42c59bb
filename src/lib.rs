//! # rusty-fxcurve
//!
//! Retrieval, caching and assembly of FX forward-rate curves from a metered
//! market-data source.
//!
//! Remote calls are expensive, so two persistent caches sit in front of the
//! source: a reference cache for point-in-time fields (scale factors,
//! quotation conventions) with a seven-day freshness window, and a history
//! cache that grows each series only at its boundaries. The
//! [`CurveBuilder`](builder::CurveBuilder) validates tickers, pulls what it
//! needs through both caches and returns an immutable
//! [`ForwardCurve`](curve::ForwardCurve).
//!
//! ## Example
//!
//! ```rust
//! use rusty_fxcurve::prelude::*;
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! let config = CurveConfig::from_toml_str(r#"
//! [pairs.EURUSD]
//! spot = "EUR Curncy"
//! direction = "direct"
//!
//! [pairs.EURUSD.forwards]
//! 1M = "EUR1M Curncy"
//! "#).unwrap();
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let mut source = InMemorySource::new();
//! source
//!     .add_reference("EUR Curncy", fields::BASE_CURRENCY, "EUR")
//!     .add_reference("EUR Curncy", fields::SECURITY_TYPE, "SPOT")
//!     .add_reference("EUR1M Curncy", fields::BASE_CURRENCY, "EUR")
//!     .add_reference("EUR1M Curncy", fields::SECURITY_TYPE, "FX FORWARD")
//!     .add_reference("EUR1M Curncy", fields::FWD_SCALE, 4.0)
//!     .add_observation("EUR Curncy", fields::LAST_PRICE, Periodicity::Daily, day, 1.0500)
//!     .add_observation("EUR1M Curncy", fields::LAST_PRICE, Periodicity::Daily, day, 250.0);
//!
//! let mut builder = CurveBuilder::in_memory(Arc::new(source)).unwrap();
//! let pair: CurrencyPair = "EURUSD".parse().unwrap();
//! let curve = builder.build(&config, &pair, day, day, Periodicity::Daily).unwrap();
//!
//! let rate = curve.rates("1M".parse().unwrap()).unwrap()[0];
//! assert!((rate - 1.0750).abs() < 1e-12);
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod currency;
pub mod curve;
pub mod error;
pub mod source;
pub mod types;
pub mod validator;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::builder::{forward_rate, CurveBuilder};
    pub use crate::cache::{HistoryCache, PartialCoverage, ReferenceCache, SeriesKey};
    pub use crate::config::{CacheSettings, CurveConfig, PairCurveSpec};
    pub use crate::currency::{Currency, CurrencyPair, QuotationDirection};
    pub use crate::curve::ForwardCurve;
    pub use crate::error::{FxCurveError, Result};
    pub use crate::source::{InMemorySource, MarketDataSource};
    pub use crate::types::{fields, Periodicity, ReferenceValue, Tenor};
    pub use crate::validator::CurveValidator;
}
