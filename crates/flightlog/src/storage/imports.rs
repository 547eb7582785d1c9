//! History of CSV imports, used to refuse importing the same file twice.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use super::{timestamp_column, Storage};
use crate::error::Result;
use crate::model::ImportRun;

impl Storage {
    /// Record a completed import.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record_import(
        &self,
        file_name: &str,
        content_hash: &str,
        rows_imported: u64,
        rows_failed: u64,
    ) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO import_runs (file_name, content_hash, imported_at, rows_imported, rows_failed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                file_name,
                content_hash,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                i64::try_from(rows_imported).unwrap_or(i64::MAX),
                i64::try_from(rows_failed).unwrap_or(i64::MAX),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find the most recent import of a file with the given content hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_import_by_hash(&self, content_hash: &str) -> Result<Option<ImportRun>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, file_name, content_hash, imported_at, rows_imported, rows_failed
                FROM import_runs
                WHERE content_hash = ?1
                ORDER BY id DESC
                LIMIT 1
                ",
                [content_hash],
                |row| {
                    let rows_imported: i64 = row.get(4)?;
                    let rows_failed: i64 = row.get(5)?;
                    Ok(ImportRun {
                        id: row.get(0)?,
                        file_name: row.get(1)?,
                        content_hash: row.get(2)?,
                        imported_at: timestamp_column(row, 3)?,
                        rows_imported: rows_imported.unsigned_abs(),
                        rows_failed: rows_failed.unsigned_abs(),
                    })
                },
            )
            .optional()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::test_support::*;

    #[test]
    fn test_record_and_find() {
        let storage = storage();
        let id = storage.record_import("flights.csv", "abc123", 10, 2).unwrap();

        let run = storage.find_import_by_hash("abc123").unwrap().unwrap();
        assert_eq!(run.id, id);
        assert_eq!(run.file_name, "flights.csv");
        assert_eq!(run.rows_imported, 10);
        assert_eq!(run.rows_failed, 2);
    }

    #[test]
    fn test_find_unknown_hash() {
        assert!(storage().find_import_by_hash("nope").unwrap().is_none());
    }

    #[test]
    fn test_find_returns_latest() {
        let storage = storage();
        storage.record_import("first.csv", "same", 1, 0).unwrap();
        storage.record_import("second.csv", "same", 1, 0).unwrap();

        let run = storage.find_import_by_hash("same").unwrap().unwrap();
        assert_eq!(run.file_name, "second.csv");
    }
}
