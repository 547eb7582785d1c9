//! Configuration management for flightlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "logbook.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTLOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/flightlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Web API configuration.
    pub server: ServerConfig,
    /// Property value formatting.
    pub values: ValuesConfig,
    /// CSV import configuration.
    pub import: ImportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/flightlog/logbook.db`
    pub database_path: Option<PathBuf>,
}

/// Web API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum time a request may take, in seconds.
    pub request_timeout_secs: u64,
}

/// How property values are parsed and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuesConfig {
    /// `chrono` format strings accepted for date values, tried in order.
    /// The first one is also used to render dates back to text.
    pub date_formats: Vec<String>,
}

/// CSV import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Header of the column holding the drone name.
    pub drone_column: String,
    /// Header of the column holding the operator number.
    pub operator_column: String,
    /// Header of the column holding the flight location.
    pub location_column: String,
    /// Header of the column holding the take-off time.
    pub start_column: String,
    /// Header of the column holding the landing time.
    pub end_column: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ValuesConfig {
    fn default() -> Self {
        Self {
            date_formats: default_date_formats(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            drone_column: "Drone".to_string(),
            operator_column: "Operator".to_string(),
            location_column: "Location".to_string(),
            start_column: "Start".to_string(),
            end_column: "End".to_string(),
        }
    }
}

/// Default accepted date formats.
fn default_date_formats() -> Vec<String> {
    vec![
        "%Y-%m-%d %H:%M:%S".to_string(),
        "%Y-%m-%d %H:%M".to_string(),
        "%Y-%m-%dT%H:%M:%S".to_string(),
        "%Y-%m-%d".to_string(),
        "%d/%m/%Y %H:%M".to_string(),
        "%d/%m/%Y".to_string(),
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("FLIGHTLOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.request_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "server host must not be empty".to_string(),
            });
        }

        if self.values.date_formats.is_empty() {
            return Err(Error::ConfigValidation {
                message: "at least one date format is required".to_string(),
            });
        }

        // chrono reports bad specifiers lazily, so check each format up front
        for format in &self.values.date_formats {
            if !is_valid_date_format(format) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid date format: {format}"),
                });
            }
        }

        if !self.import.delimiter.is_ascii() || self.import.delimiter.is_ascii_alphanumeric() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "import delimiter must be an ASCII punctuation or whitespace character, got {:?}",
                    self.import.delimiter
                ),
            });
        }

        let columns = self.import.reserved_columns();
        for (i, column) in columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "import column names must not be empty".to_string(),
                });
            }
            if columns[..i].contains(column) {
                return Err(Error::ConfigValidation {
                    message: format!("import column '{column}' is configured twice"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the address the web API binds to.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("invalid server address {}:{}", self.server.host, self.server.port),
            })
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl ImportConfig {
    /// Headers that map to flight columns rather than flight properties.
    #[must_use]
    pub fn reserved_columns(&self) -> [&str; 5] {
        [
            &self.drone_column,
            &self.operator_column,
            &self.location_column,
            &self.start_column,
            &self.end_column,
        ]
    }

    /// The delimiter as the byte the CSV reader expects.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

fn is_valid_date_format(format: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};

    !format.trim().is_empty() && StrftimeItems::new(format).all(|item| item != Item::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.import.delimiter, ',');
        assert!(!config.values.date_formats.is_empty());
    }

    #[test]
    fn test_default_import_config() {
        let import = ImportConfig::default();

        assert_eq!(import.drone_column, "Drone");
        assert_eq!(import.operator_column, "Operator");
        assert_eq!(import.location_column, "Location");
        assert_eq!(import.start_column, "Start");
        assert_eq!(import.end_column, "End");
        assert_eq!(import.delimiter_byte(), b',');
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.server.request_timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("request_timeout_secs"));
    }

    #[test]
    fn test_validate_no_date_formats() {
        let mut config = Config::default();
        config.values.date_formats.clear();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("date format"));
    }

    #[test]
    fn test_validate_bad_date_format() {
        let mut config = Config::default();
        config.values.date_formats = vec!["%Y-%Q".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid date format"));
    }

    #[test]
    fn test_validate_alphanumeric_delimiter() {
        let mut config = Config::default();
        config.import.delimiter = 'x';

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("delimiter"));
    }

    #[test]
    fn test_validate_semicolon_delimiter() {
        let mut config = Config::default();
        config.import.delimiter = ';';

        assert!(config.validate().is_ok());
        assert_eq!(config.import.delimiter_byte(), b';');
    }

    #[test]
    fn test_validate_duplicate_columns() {
        let mut config = Config::default();
        config.import.end_column = "Start".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("configured twice"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("logbook.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_bind_addr_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_request_timeout() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flightlog"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[import]
delimiter = ";"
drone_column = "Aircraft"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.import.delimiter, ';');
        assert_eq!(config.import.drone_column, "Aircraft");
        assert_eq!(config.import.operator_column, "Operator");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nrequest_timeout_secs = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("date_formats"));
        assert!(json.contains("drone_column"));
    }
}
