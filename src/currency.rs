//! Currencies, currency pairs and quotation direction

use crate::error::{FxCurveError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    USD, // US Dollar
    EUR, // Euro
    GBP, // British Pound
    JPY, // Japanese Yen
    CHF, // Swiss Franc
    CAD, // Canadian Dollar
    AUD, // Australian Dollar
    NZD, // New Zealand Dollar
    CNY, // Chinese Yuan
    HKD, // Hong Kong Dollar
    SGD, // Singapore Dollar
    KRW, // South Korean Won
    INR, // Indian Rupee
    BRL, // Brazilian Real
    MXN, // Mexican Peso
    ZAR, // South African Rand
    SEK, // Swedish Krona
    NOK, // Norwegian Krone
    TRY, // Turkish Lira
}

impl Currency {
    /// Get currency code as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::CNY => "CNY",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::KRW => "KRW",
            Currency::INR => "INR",
            Currency::BRL => "BRL",
            Currency::MXN => "MXN",
            Currency::ZAR => "ZAR",
            Currency::SEK => "SEK",
            Currency::NOK => "NOK",
            Currency::TRY => "TRY",
        }
    }
}

impl FromStr for Currency {
    type Err = FxCurveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            "CHF" => Ok(Currency::CHF),
            "CAD" => Ok(Currency::CAD),
            "AUD" => Ok(Currency::AUD),
            "NZD" => Ok(Currency::NZD),
            "CNY" => Ok(Currency::CNY),
            "HKD" => Ok(Currency::HKD),
            "SGD" => Ok(Currency::SGD),
            "KRW" => Ok(Currency::KRW),
            "INR" => Ok(Currency::INR),
            "BRL" => Ok(Currency::BRL),
            "MXN" => Ok(Currency::MXN),
            "ZAR" => Ok(Currency::ZAR),
            "SEK" => Ok(Currency::SEK),
            "NOK" => Ok(Currency::NOK),
            "TRY" => Ok(Currency::TRY),
            _ => Err(FxCurveError::Parse(format!("Unknown currency: {}", s))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Currency pair: `base` is the home currency, `foreign` the other leg.
///
/// Written as six letters (`EURUSD`) or with a slash (`EUR/USD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyPair {
    pub base: Currency,
    pub foreign: Currency,
}

impl CurrencyPair {
    pub fn new(base: Currency, foreign: Currency) -> Self {
        Self { base, foreign }
    }

    /// Pair with legs swapped
    pub fn inverse(&self) -> Self {
        Self {
            base: self.foreign,
            foreign: self.base,
        }
    }

    /// Compact code, e.g. `EURUSD`
    pub fn code(&self) -> String {
        format!("{}{}", self.base.as_str(), self.foreign.as_str())
    }
}

impl FromStr for CurrencyPair {
    type Err = FxCurveError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (base, foreign) = if let Some((base, foreign)) = s.split_once('/') {
            (base, foreign)
        } else if s.len() == 6 && s.is_ascii() {
            s.split_at(3)
        } else {
            return Err(FxCurveError::Parse(format!(
                "Invalid currency pair format: {}",
                s
            )));
        };

        let pair = Self::new(base.parse()?, foreign.parse()?);
        if pair.base == pair.foreign {
            return Err(FxCurveError::Parse(format!(
                "Currency pair needs two distinct currencies: {}",
                s
            )));
        }
        Ok(pair)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.base, self.foreign)
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for CurrencyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How a pair's rates are quoted.
///
/// `Direct` rates are foreign currency per unit of base; `Indirect` rates are
/// base currency per unit of foreign. Curves carry the tag and never invert
/// numbers themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationDirection {
    Direct,
    Indirect,
}

impl QuotationDirection {
    /// Currency one unit of which is priced by the instrument's quotes
    pub fn priced_currency(&self, pair: &CurrencyPair) -> Currency {
        match self {
            QuotationDirection::Direct => pair.base,
            QuotationDirection::Indirect => pair.foreign,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationDirection::Direct => "direct",
            QuotationDirection::Indirect => "indirect",
        }
    }
}

impl FromStr for QuotationDirection {
    type Err = FxCurveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(QuotationDirection::Direct),
            "indirect" => Ok(QuotationDirection::Indirect),
            _ => Err(FxCurveError::Parse(format!(
                "Unknown quotation direction: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for QuotationDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
