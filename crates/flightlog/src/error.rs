//! Error types for flightlog.
//!
//! This module defines all error types used throughout the flightlog crate,
//! providing detailed context for debugging and user-friendly error messages.
//!
//! Property value errors (`InvalidFormat`, `MissingField`, `OutOfRange`,
//! `UnknownProperty`, `DuplicateField`) are local and recoverable: callers
//! attribute them to a form field or an import row and keep going.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flightlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// A referenced record does not exist.
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Kind of record (operator, drone, ...).
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// A record clashes with an existing one (unique or foreign key constraint).
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// A record failed validation before reaching the database.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    // === Property Value Errors ===
    /// A raw value cannot be parsed as the target type.
    #[error("invalid value for '{field}': '{value}' is not a valid {expected}")]
    InvalidFormat {
        /// Field or property name.
        field: String,
        /// The offending raw value.
        value: String,
        /// Human-readable name of the expected type.
        expected: &'static str,
    },

    /// An expected column is absent from a row.
    #[error("missing field '{field}': row has no column {index}")]
    MissingField {
        /// Field name.
        field: String,
        /// Zero-based column index that was requested.
        index: usize,
    },

    /// A numeric identifier or value exceeds its representable range.
    #[error("value for '{field}' is out of range: {value}")]
    OutOfRange {
        /// Field name.
        field: String,
        /// The offending raw value.
        value: String,
    },

    /// A submitted property id has no matching definition.
    #[error("unknown flight property id {id}")]
    UnknownProperty {
        /// The unmatched property id.
        id: i64,
    },

    /// The same property was submitted more than once.
    #[error("duplicate form field '{name}'")]
    DuplicateField {
        /// The repeated field name.
        name: String,
    },

    // === Import Errors ===
    /// Reading a CSV file failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has been imported before.
    #[error("{path} was already imported on {imported_at}")]
    AlreadyImported {
        /// Path of the file being imported.
        path: PathBuf,
        /// When the earlier import ran.
        imported_at: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flightlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a not-found error for the given record kind.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid format error.
    #[must_use]
    pub fn invalid_format(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            value: value.into(),
            expected,
        }
    }

    /// Check if this error is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error concerns a single submitted value or cell.
    ///
    /// These errors never abort a whole submission or import.
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat { .. }
                | Self::MissingField { .. }
                | Self::OutOfRange { .. }
                | Self::UnknownProperty { .. }
                | Self::DuplicateField { .. }
        )
    }

    /// Stable, machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseOpen { .. } | Self::DatabaseQuery(_) | Self::DatabaseMigration { .. } => {
                "STORAGE_ERROR"
            }
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => "CONFIG_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } | Self::AlreadyImported { .. } => "CONFLICT",
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::UnknownProperty { .. } => "UNKNOWN_PROPERTY",
            Self::DuplicateField { .. } => "DUPLICATE_FIELD",
            Self::Csv(_) => "CSV_ERROR",
            Self::Io(_) | Self::DirectoryCreate { .. } => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("drone", 42);
        assert_eq!(err.to_string(), "drone '42' not found");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_invalid_format_names_field_and_value() {
        let err = Error::invalid_format("Wind Speed", "breezy", "number");
        let msg = err.to_string();
        assert!(msg.contains("Wind Speed"));
        assert!(msg.contains("breezy"));
        assert!(msg.contains("number"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = Error::MissingField {
            field: "Location".to_string(),
            index: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("Location"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_out_of_range_display() {
        let err = Error::OutOfRange {
            field: "FPV_99999999999999999999".to_string(),
            value: "99999999999999999999".to_string(),
        };
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_unknown_property_display() {
        let err = Error::UnknownProperty { id: 17 };
        assert_eq!(err.to_string(), "unknown flight property id 17");
    }

    #[test]
    fn test_is_value_error() {
        assert!(Error::UnknownProperty { id: 1 }.is_value_error());
        assert!(Error::invalid_format("a", "b", "date").is_value_error());
        assert!(Error::DuplicateField {
            name: "FPV_1".to_string()
        }
        .is_value_error());
        assert!(!Error::not_found("flight", 1).is_value_error());
        assert!(!Error::internal("x").is_value_error());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("operator", 3).is_not_found());
        assert!(!Error::conflict("dup").is_not_found());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::not_found("drone", 1).code(), "NOT_FOUND");
        assert_eq!(Error::conflict("x").code(), "CONFLICT");
        assert_eq!(Error::validation("x").code(), "VALIDATION_FAILED");
        assert_eq!(Error::invalid_format("a", "b", "date").code(), "INVALID_FORMAT");
        assert_eq!(
            Error::MissingField {
                field: "a".to_string(),
                index: 0
            }
            .code(),
            "MISSING_FIELD"
        );
        assert_eq!(Error::UnknownProperty { id: 1 }.code(), "UNKNOWN_PROPERTY");
        assert_eq!(Error::internal("x").code(), "INTERNAL");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert_eq!(err.code(), "STORAGE_ERROR");
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_already_imported_display() {
        let err = Error::AlreadyImported {
            path: PathBuf::from("/logs/march.csv"),
            imported_at: "2024-03-31T10:00:00+00:00".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/logs/march.csv"));
        assert!(msg.contains("2024-03-31"));
        assert_eq!(err.code(), "CONFLICT");
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
