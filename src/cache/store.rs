//! SQLite persistence for the reference and history caches
//!
//! Two independent stores share one file format but never one table:
//! - [`ReferenceStore`]: `reference_records`, one row per (instrument, field)
//! - [`HistoryStore`]: `history_coverage` plus `history_observations`
//!
//! Dates are stored as `YYYY-MM-DD` text so lexical order is date order.

use super::history::{HistorySeries, SeriesKey};
use crate::error::{FxCurveError, Result};
use crate::source::Observations;
use crate::types::{Periodicity, ReferenceValue};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| FxCurveError::Storage(format!("Corrupt date '{}' in cache: {}", s, e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A cached reference field, replaced wholesale on every refresh
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub instrument: String,
    pub field: String,
    pub value: ReferenceValue,
    pub fetched_at: DateTime<Utc>,
}

impl ReferenceRecord {
    /// Whether this record is still inside the freshness window at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Persistent store of point-in-time reference fields
pub struct ReferenceStore {
    conn: Connection,
}

impl ReferenceStore {
    /// Create or open database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            FxCurveError::Storage(format!("Failed to open {}: {}", db_path.display(), e))
        })?;
        Self::with_connection(conn)
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS reference_records (
                instrument TEXT NOT NULL,
                field TEXT NOT NULL,
                value_json TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (instrument, field)
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, instrument: &str, field: &str) -> Result<Option<ReferenceRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT value_json, fetched_at FROM reference_records
                 WHERE instrument = ?1 AND field = ?2",
                params![instrument, field],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((value_json, fetched_at)) = row else {
            return Ok(None);
        };
        let value: ReferenceValue = serde_json::from_str(&value_json)?;
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .map_err(|e| FxCurveError::Storage(format!("Corrupt timestamp in cache: {}", e)))?
            .with_timezone(&Utc);

        Ok(Some(ReferenceRecord {
            instrument: instrument.to_string(),
            field: field.to_string(),
            value,
            fetched_at,
        }))
    }

    /// Write records in one transaction, replacing any previous version
    pub fn put_all(&mut self, records: &[ReferenceRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO reference_records (instrument, field, value_json, fetched_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.instrument,
                    record.field,
                    serde_json::to_string(&record.value)?,
                    record.fetched_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop every field cached for `instrument`
    pub fn remove_instrument(&mut self, instrument: &str) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM reference_records WHERE instrument = ?1",
            params![instrument],
        )?;
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM reference_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Persistent store of time series and their covered intervals
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Create or open database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            FxCurveError::Storage(format!("Failed to open {}: {}", db_path.display(), e))
        })?;
        Self::with_connection(conn)
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history_coverage (
                instrument TEXT NOT NULL,
                field TEXT NOT NULL,
                periodicity TEXT NOT NULL,
                covered_start TEXT NOT NULL,
                covered_end TEXT NOT NULL,
                PRIMARY KEY (instrument, field, periodicity)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history_observations (
                instrument TEXT NOT NULL,
                field TEXT NOT NULL,
                periodicity TEXT NOT NULL,
                obs_date TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (instrument, field, periodicity, obs_date)
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Load the full cached series for `key`, if any
    pub fn load(&self, key: &SeriesKey) -> Result<Option<HistorySeries>> {
        let coverage = self
            .conn
            .query_row(
                "SELECT covered_start, covered_end FROM history_coverage
                 WHERE instrument = ?1 AND field = ?2 AND periodicity = ?3",
                params![key.instrument, key.field, key.periodicity.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((start, end)) = coverage else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT obs_date, value FROM history_observations
             WHERE instrument = ?1 AND field = ?2 AND periodicity = ?3
             ORDER BY obs_date",
        )?;
        let rows = stmt
            .query_map(
                params![key.instrument, key.field, key.periodicity.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut observations = Observations::new();
        for (date, value) in rows {
            observations.insert(parse_date(&date)?, value);
        }

        Ok(Some(HistorySeries::from_parts(
            key.clone(),
            observations,
            parse_date(&start)?,
            parse_date(&end)?,
        )))
    }

    /// Persist an extended series: new observations are inserted without
    /// touching already-stored dates, and the coverage row is replaced.
    pub fn save_extension(&mut self, series: &HistorySeries, fetched: &Observations) -> Result<()> {
        let key = series.key();
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO history_observations
                 (instrument, field, periodicity, obs_date, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (date, value) in fetched {
                insert.execute(params![
                    key.instrument,
                    key.field,
                    key.periodicity.as_str(),
                    format_date(*date),
                    value,
                ])?;
            }
            tx.execute(
                "INSERT OR REPLACE INTO history_coverage
                 (instrument, field, periodicity, covered_start, covered_end)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key.instrument,
                    key.field,
                    key.periodicity.as_str(),
                    format_date(series.covered_start()),
                    format_date(series.covered_end()),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Every cached key with its covered interval
    pub fn coverage_all(&self) -> Result<Vec<(SeriesKey, NaiveDate, NaiveDate)>> {
        let mut stmt = self.conn.prepare(
            "SELECT instrument, field, periodicity, covered_start, covered_end
             FROM history_coverage ORDER BY instrument, field, periodicity",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(instrument, field, periodicity, start, end)| {
                let periodicity: Periodicity = periodicity.parse()?;
                Ok((
                    SeriesKey::new(&instrument, &field, periodicity),
                    parse_date(&start)?,
                    parse_date(&end)?,
                ))
            })
            .collect()
    }

    pub fn observation_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM history_observations",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
