//! Row-to-record conversion.
//!
//! Rows are read in two steps: [`RawApplication::from_row`] copies the
//! columns out while the statement is live, then
//! [`RawApplication::into_application`] parses the timestamps. Keeping the
//! parse outside the row callback lets bad data surface as
//! [`StoreError::Conversion`] instead of a generic driver error.

use chrono::{DateTime, NaiveDateTime, Utc};
use jobtracker_core::{Application, Column};
use rusqlite::Row;

use crate::error::{Result, StoreError};

/// Layout SQLite's own `datetime()` produces.
const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Column values of one `applications` row, timestamps still as text.
#[derive(Debug, Clone)]
pub(crate) struct RawApplication {
    id: i64,
    company: String,
    position: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl RawApplication {
    /// Reads a row selected with [`select_list`](crate::schema::select_list).
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            company: row.get(1)?,
            position: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    pub(crate) fn into_application(self) -> Result<Application> {
        Ok(Application {
            created_at: parse_timestamp(Column::CreatedAt, &self.created_at)?,
            updated_at: parse_timestamp(Column::UpdatedAt, &self.updated_at)?,
            id: self.id,
            company: self.company,
            position: self.position,
            status: self.status,
        })
    }
}

/// Parses a stored timestamp.
///
/// RFC 3339 is what the store writes. Offset-less `YYYY-MM-DD HH:MM:SS`
/// text, as written by SQLite's `datetime('now')`, is read as UTC.
pub(crate) fn parse_timestamp(column: Column, raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQLITE_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|err| StoreError::Conversion(format!("invalid {column} value {raw:?}: {err}")))
}
