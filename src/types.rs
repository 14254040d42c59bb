//! Core value types shared by the caches and the curve builder

use crate::error::{FxCurveError, Result};
use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field names understood by the market-data source
pub mod fields {
    /// Power-of-ten divisor for a forward ticker's points
    pub const FWD_SCALE: &str = "FWD_SCALE";
    /// Currency one unit of which the instrument prices
    pub const BASE_CURRENCY: &str = "BASE_CRNCY";
    /// Instrument type description (e.g. `FX FORWARD`, `SPOT`)
    pub const SECURITY_TYPE: &str = "SECURITY_TYP";
    /// Last price; spot rate for spot tickers, points for forward tickers
    pub const LAST_PRICE: &str = "PX_LAST";
}

/// Sampling periodicity of a historical series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    SemiAnnually,
    Yearly,
}

impl Periodicity {
    /// Nominal spacing between two observations
    pub fn step(&self) -> Duration {
        match self {
            Periodicity::Daily => Duration::days(1),
            Periodicity::Weekly => Duration::days(7),
            Periodicity::Monthly => Duration::days(31),
            Periodicity::Quarterly => Duration::days(92),
            Periodicity::SemiAnnually => Duration::days(183),
            Periodicity::Yearly => Duration::days(366),
        }
    }

    /// Largest distance between a requested boundary and the nearest
    /// observation that is still explained by weekends and holidays.
    pub fn gap_tolerance(&self) -> Duration {
        match self {
            Periodicity::Daily => Duration::days(4),
            _ => self.step() + Duration::days(3),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Monthly => "monthly",
            Periodicity::Quarterly => "quarterly",
            Periodicity::SemiAnnually => "semi_annually",
            Periodicity::Yearly => "yearly",
        }
    }
}

impl FromStr for Periodicity {
    type Err = FxCurveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Periodicity::Daily),
            "weekly" | "w" | "1w" => Ok(Periodicity::Weekly),
            "monthly" | "m" | "1m" => Ok(Periodicity::Monthly),
            "quarterly" | "q" | "3m" => Ok(Periodicity::Quarterly),
            "semi_annually" | "semiannually" | "6m" => Ok(Periodicity::SemiAnnually),
            "yearly" | "annually" | "y" | "1y" => Ok(Periodicity::Yearly),
            _ => Err(FxCurveError::Parse(format!("Unknown periodicity: {}", s))),
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenorUnit {
    Day,
    Week,
    Month,
    Year,
}

impl TenorUnit {
    fn suffix(&self) -> char {
        match self {
            TenorUnit::Day => 'D',
            TenorUnit::Week => 'W',
            TenorUnit::Month => 'M',
            TenorUnit::Year => 'Y',
        }
    }

    fn approx_days(&self) -> u32 {
        match self {
            TenorUnit::Day => 1,
            TenorUnit::Week => 7,
            TenorUnit::Month => 30,
            TenorUnit::Year => 365,
        }
    }
}

/// Forward maturity bucket such as `1W`, `3M` or `1Y`.
///
/// Tenors order by approximate length so curve columns read short to long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tenor {
    count: u32,
    unit: TenorUnit,
}

impl Tenor {
    pub fn new(count: u32, unit: TenorUnit) -> Self {
        Self { count, unit }
    }

    pub fn months(count: u32) -> Self {
        Self::new(count, TenorUnit::Month)
    }

    pub fn approx_days(&self) -> u32 {
        self.count.saturating_mul(self.unit.approx_days())
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> TenorUnit {
        self.unit
    }
}

impl Ord for Tenor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.approx_days()
            .cmp(&other.approx_days())
            .then_with(|| self.unit.approx_days().cmp(&other.unit.approx_days()))
    }
}

impl PartialOrd for Tenor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Tenor {
    type Err = FxCurveError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_uppercase();
        if s == "ON" {
            return Ok(Tenor::new(1, TenorUnit::Day));
        }

        let invalid = || FxCurveError::Parse(format!("Invalid tenor: {}", s));
        let unit = match s.chars().last().ok_or_else(invalid)? {
            'D' => TenorUnit::Day,
            'W' => TenorUnit::Week,
            'M' => TenorUnit::Month,
            'Y' => TenorUnit::Year,
            _ => return Err(invalid()),
        };
        let count: u32 = s[..s.len() - 1].parse().map_err(|_| invalid())?;
        if count == 0 || count.checked_mul(unit.approx_days()).is_none() {
            return Err(invalid());
        }
        Ok(Tenor::new(count, unit))
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl Serialize for Tenor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tenor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Scalar value of a point-in-time reference field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceValue {
    Number(f64),
    Text(String),
}

impl ReferenceValue {
    /// Numeric view; numeric text such as `"4"` is accepted too
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReferenceValue::Number(n) => Some(*n),
            ReferenceValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ReferenceValue::Text(s) => Some(s),
            ReferenceValue::Number(_) => None,
        }
    }
}

impl From<f64> for ReferenceValue {
    fn from(value: f64) -> Self {
        ReferenceValue::Number(value)
    }
}

impl From<&str> for ReferenceValue {
    fn from(value: &str) -> Self {
        ReferenceValue::Text(value.to_string())
    }
}

impl fmt::Display for ReferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceValue::Number(n) => write!(f, "{}", n),
            ReferenceValue::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodicity_from_str() {
        assert_eq!("daily".parse::<Periodicity>().unwrap(), Periodicity::Daily);
        assert_eq!("W".parse::<Periodicity>().unwrap(), Periodicity::Weekly);
        assert_eq!(
            "semi_annually".parse::<Periodicity>().unwrap(),
            Periodicity::SemiAnnually
        );
        assert!("hourly".parse::<Periodicity>().is_err());
    }

    #[test]
    fn test_gap_tolerance_covers_long_weekend() {
        assert_eq!(Periodicity::Daily.gap_tolerance(), Duration::days(4));
        assert!(Periodicity::Weekly.gap_tolerance() > Periodicity::Weekly.step());
    }

    #[test]
    fn test_tenor_parsing_and_display() {
        let t: Tenor = "3m".parse().unwrap();
        assert_eq!(t, Tenor::months(3));
        assert_eq!(t.to_string(), "3M");
        assert_eq!("ON".parse::<Tenor>().unwrap().to_string(), "1D");
        assert!("0M".parse::<Tenor>().is_err());
        assert!("M".parse::<Tenor>().is_err());
        assert!("3X".parse::<Tenor>().is_err());
    }

    #[test]
    fn test_tenor_length_must_fit_in_days() {
        assert!("4294967295Y".parse::<Tenor>().is_err());
        assert!("4294967295D".parse::<Tenor>().is_ok());
        // Built directly, an oversized tenor still orders without overflow
        let huge = Tenor::new(u32::MAX, TenorUnit::Year);
        assert!(Tenor::months(1) < huge);
    }

    #[test]
    fn test_tenor_ordering() {
        let mut tenors: Vec<Tenor> = ["1Y", "1W", "6M", "1M", "12M"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        tenors.sort();
        let labels: Vec<String> = tenors.iter().map(|t| t.to_string()).collect();
        assert_eq!(labels, vec!["1W", "1M", "6M", "12M", "1Y"]);
    }

    #[test]
    fn test_reference_value() {
        assert_eq!(ReferenceValue::from(4.0).as_f64(), Some(4.0));
        assert_eq!(ReferenceValue::from("4").as_f64(), Some(4.0));
        assert_eq!(ReferenceValue::from("USD").as_text(), Some("USD"));
        let json = serde_json::to_string(&ReferenceValue::from(2.0)).unwrap();
        let back: ReferenceValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReferenceValue::Number(2.0));
    }
}
