//! `SQLite` schema definitions for flightlog.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the operators table.
pub const CREATE_OPERATORS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS operators (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_names TEXT NOT NULL,
    surname TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    flyer_number TEXT NOT NULL,
    operator_number TEXT NOT NULL UNIQUE
)
";

/// SQL statement to create the drones table.
pub const CREATE_DRONES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS drones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    make TEXT NOT NULL,
    model TEXT NOT NULL,
    serial_number TEXT NOT NULL
)
";

/// SQL statement to create the flight property definitions table.
pub const CREATE_PROPERTIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flight_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    data_type TEXT NOT NULL CHECK (data_type IN ('date', 'number', 'string'))
)
";

/// SQL statement to create the flights table.
pub const CREATE_FLIGHTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    drone_id INTEGER NOT NULL REFERENCES drones(id),
    operator_id INTEGER NOT NULL REFERENCES operators(id),
    location TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL
)
";

/// SQL statement to create the flight property values table.
///
/// Exactly one of the three value columns is set on every row.
pub const CREATE_PROPERTY_VALUES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flight_property_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    flight_id INTEGER NOT NULL REFERENCES flights(id) ON DELETE CASCADE,
    property_id INTEGER NOT NULL REFERENCES flight_properties(id),
    date_value TEXT,
    number_value TEXT,
    string_value TEXT,
    UNIQUE (flight_id, property_id),
    CHECK ((date_value IS NOT NULL) + (number_value IS NOT NULL) + (string_value IS NOT NULL) = 1)
)
";

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the import runs table.
pub const CREATE_IMPORT_RUNS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS import_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    imported_at TEXT NOT NULL,
    rows_imported INTEGER NOT NULL,
    rows_failed INTEGER NOT NULL
)
";

/// SQL statement to create an index on flight start time for listing.
pub const CREATE_FLIGHT_START_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_start ON flights(start_time DESC)
";

/// SQL statement to create an index on `drone_id` for filtering.
pub const CREATE_FLIGHT_DRONE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_drone ON flights(drone_id)
";

/// SQL statement to create an index on `operator_id` for filtering.
pub const CREATE_FLIGHT_OPERATOR_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_operator ON flights(operator_id)
";

/// SQL statement to create an index on `property_id` for reference checks.
pub const CREATE_VALUES_PROPERTY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_values_property ON flight_property_values(property_id)
";

/// SQL statement to create an index on `content_hash` for import deduplication.
pub const CREATE_IMPORT_HASH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_import_runs_hash ON import_runs(content_hash)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_OPERATORS_TABLE,
    CREATE_DRONES_TABLE,
    CREATE_PROPERTIES_TABLE,
    CREATE_FLIGHTS_TABLE,
    CREATE_PROPERTY_VALUES_TABLE,
    CREATE_USERS_TABLE,
    CREATE_IMPORT_RUNS_TABLE,
    CREATE_FLIGHT_START_INDEX,
    CREATE_FLIGHT_DRONE_INDEX,
    CREATE_FLIGHT_OPERATOR_INDEX,
    CREATE_VALUES_PROPERTY_INDEX,
    CREATE_IMPORT_HASH_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_values_table_enforces_single_slot() {
        assert!(CREATE_PROPERTY_VALUES_TABLE.contains("UNIQUE (flight_id, property_id)"));
        assert!(CREATE_PROPERTY_VALUES_TABLE.contains("= 1"));
        assert!(CREATE_PROPERTY_VALUES_TABLE.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_tables_created_before_indexes() {
        let first_index = SCHEMA_STATEMENTS
            .iter()
            .position(|s| s.contains("CREATE INDEX"))
            .unwrap();
        assert!(SCHEMA_STATEMENTS[..first_index]
            .iter()
            .all(|s| s.contains("CREATE TABLE")));
    }
}
