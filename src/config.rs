//! Curve configuration and cache settings
//!
//! A [`CurveConfig`] maps each currency pair to the tickers that make up its
//! curve. It is supplied by the caller and usually read from TOML:
//!
//! ```toml
//! [pairs.EURUSD]
//! spot = "EUR Curncy"
//! direction = "direct"
//!
//! [pairs.EURUSD.forwards]
//! 1M = "EUR1M Curncy"
//! 3M = "EUR3M Curncy"
//! ```

use crate::currency::{CurrencyPair, QuotationDirection};
use crate::error::{FxCurveError, Result};
use crate::types::Tenor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Reference records older than this are treated as absent
pub const DEFAULT_REFERENCE_TTL_DAYS: i64 = 7;

/// Tickers and conventions for one pair's curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCurveSpec {
    /// Spot rate ticker
    pub spot: String,
    /// Forward-points ticker per tenor, ordered short to long
    pub forwards: BTreeMap<Tenor, String>,
    pub direction: QuotationDirection,
}

impl PairCurveSpec {
    pub fn tenors(&self) -> impl Iterator<Item = Tenor> + '_ {
        self.forwards.keys().copied()
    }

    /// Spot ticker followed by every forward ticker
    pub fn all_tickers(&self) -> Vec<&str> {
        std::iter::once(self.spot.as_str())
            .chain(self.forwards.values().map(String::as_str))
            .collect()
    }
}

/// Immutable mapping from currency pair to its curve definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    #[serde(default)]
    pairs: BTreeMap<CurrencyPair, PairCurveSpec>,
}

impl CurveConfig {
    pub fn new(pairs: BTreeMap<CurrencyPair, PairCurveSpec>) -> Result<Self> {
        let config = Self { pairs };
        config.check()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CurveConfig = toml::from_str(contents)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Curve definition for `pair`
    pub fn get(&self, pair: &CurrencyPair) -> Result<&PairCurveSpec> {
        self.pairs
            .get(pair)
            .ok_or_else(|| FxCurveError::Config(format!("No curve configured for {}", pair)))
    }

    pub fn pairs(&self) -> impl Iterator<Item = &CurrencyPair> {
        self.pairs.keys()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn check(&self) -> Result<()> {
        for (pair, spec) in &self.pairs {
            if spec.spot.trim().is_empty() {
                return Err(FxCurveError::Config(format!(
                    "{}: spot ticker is empty",
                    pair
                )));
            }
            if spec.forwards.is_empty() {
                return Err(FxCurveError::Config(format!(
                    "{}: at least one forward tenor is required",
                    pair
                )));
            }
            if let Some((tenor, _)) = spec.forwards.iter().find(|(_, t)| t.trim().is_empty()) {
                return Err(FxCurveError::Config(format!(
                    "{}: forward ticker for {} is empty",
                    pair, tenor
                )));
            }
        }
        Ok(())
    }
}

/// Where and how long cached market data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// SQLite database holding both stores
    pub db_path: PathBuf,
    #[serde(default = "default_reference_ttl_days")]
    pub reference_ttl_days: i64,
}

fn default_reference_ttl_days() -> i64 {
    DEFAULT_REFERENCE_TTL_DAYS
}

impl CacheSettings {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            reference_ttl_days: DEFAULT_REFERENCE_TTL_DAYS,
        }
    }

    pub fn reference_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.reference_ttl_days)
    }
}
