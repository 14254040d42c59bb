//! Error types for rusty-fxcurve

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for curve retrieval and caching
#[derive(Error, Debug)]
pub enum FxCurveError {
    /// Instrument metadata disagrees with the requested pair or instrument kind.
    #[error("Validation failed for {ticker}: {reason}")]
    Validation { ticker: String, reason: String },

    /// Remote fetch failed or a requested field/series was absent.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl FxCurveError {
    /// Shorthand for a validation failure on `ticker`
    pub fn validation(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        FxCurveError::Validation {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }

    /// Every error aborts the call that produced it; partial coverage is
    /// reported through [`crate::cache::PartialCoverage`] instead.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Whether a caller may reasonably repeat the call later.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxCurveError::DataUnavailable(_))
    }
}

impl From<rusqlite::Error> for FxCurveError {
    fn from(err: rusqlite::Error) -> Self {
        FxCurveError::Storage(err.to_string())
    }
}

impl From<csv::Error> for FxCurveError {
    fn from(err: csv::Error) -> Self {
        FxCurveError::Parse(format!("CSV error: {}", err))
    }
}

impl From<toml::de::Error> for FxCurveError {
    fn from(err: toml::de::Error) -> Self {
        FxCurveError::Config(format!("Invalid TOML: {}", err))
    }
}

/// Result type alias for rusty-fxcurve operations
pub type Result<T> = std::result::Result<T, FxCurveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = FxCurveError::validation("EUR1M Curncy", "security type is SPOT");
        let msg = err.to_string();
        assert!(msg.contains("EUR1M Curncy"));
        assert!(msg.contains("SPOT"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_data_unavailable_is_retryable() {
        let err = FxCurveError::DataUnavailable("timeout".to_string());
        assert!(err.is_retryable());
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_range_message() {
        let err = FxCurveError::InvalidRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert!(err.to_string().contains("2024-02-01"));
    }
}
