//! Storage layer for flightlog.
//!
//! This module provides `SQLite`-based persistent storage for the logbook:
//! operators, drones, flights, flight property definitions and values, users
//! and the history of CSV imports. Each record kind lives in its own
//! submodule as an `impl Storage` block.

mod drones;
mod flights;
mod imports;
pub mod migrations;
mod operators;
mod properties;
pub mod schema;
mod users;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Text format for date/time columns. Sorts chronologically as text.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Text format for date columns.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage engine for the logbook.
///
/// Provides persistent storage using `SQLite` with support for:
/// - CRUD over operators, drones, flights, property definitions and users
/// - Typed flight property values with one value per property per flight
/// - Filtered flight listing
/// - A history of imported files for deduplication
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets the importer and the web API read while the other writes
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count the rows of one table.
    fn count_rows(&self, table: &str) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let last_flight: Option<String> = self.conn.query_row(
            "SELECT MAX(start_time) FROM flights",
            [],
            |row| row.get(0),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            operators: self.count_rows("operators")?,
            drones: self.count_rows("drones")?,
            flights: self.count_rows("flights")?,
            properties: self.count_rows("flight_properties")?,
            users: self.count_rows("users")?,
            last_flight: last_flight
                .and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT).ok()),
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of operators.
    pub operators: i64,
    /// Number of drones.
    pub drones: i64,
    /// Number of flights.
    pub flights: i64,
    /// Number of flight property definitions.
    pub properties: i64,
    /// Number of users.
    pub users: i64,
    /// Start time of the most recent flight.
    pub last_flight: Option<NaiveDateTime>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Map a constraint violation to `Conflict`, passing other errors through.
fn on_constraint(err: rusqlite::Error, message: impl FnOnce() -> String) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            Error::conflict(message())
        }
        other => other.into(),
    }
}

fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Read a date/time column.
fn datetime_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let text: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a date column.
fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read an RFC 3339 timestamp column.
fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
