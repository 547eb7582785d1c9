//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::import::ImportOptions;
use crate::properties::PropertyDataType;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides the configured host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides the configured port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// CSV file with one flight per row
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Check every row without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Import even if this file was imported before
    #[arg(short, long)]
    pub force: bool,

    /// Print the import report as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ImportCommand {
    /// Options for the importer.
    #[must_use]
    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            dry_run: self.dry_run,
            force: self.force,
        }
    }
}

/// Flight property commands.
#[derive(Debug, Subcommand)]
pub enum PropertyCommand {
    /// Define a new flight property
    Add {
        /// Property name, as used in CSV headers
        name: String,

        /// Type of value the property holds
        #[arg(value_enum)]
        data_type: DataTypeArg,
    },

    /// List the defined flight properties
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Property data type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataTypeArg {
    /// Dates, with or without a time of day
    Date,
    /// Decimal numbers
    Number,
    /// Free text
    String,
}

impl From<DataTypeArg> for PropertyDataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Date => Self::Date,
            DataTypeArg::Number => Self::Number,
            DataTypeArg::String => Self::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_arg_conversion() {
        assert_eq!(
            PropertyDataType::from(DataTypeArg::Date),
            PropertyDataType::Date
        );
        assert_eq!(
            PropertyDataType::from(DataTypeArg::Number),
            PropertyDataType::Number
        );
        assert_eq!(
            PropertyDataType::from(DataTypeArg::String),
            PropertyDataType::String
        );
    }

    #[test]
    fn test_import_options() {
        let cmd = ImportCommand {
            file: PathBuf::from("flights.csv"),
            dry_run: true,
            force: false,
            json: false,
        };
        assert_eq!(
            cmd.options(),
            ImportOptions {
                dry_run: true,
                force: false
            }
        );
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_property_command_debug() {
        let cmd = PropertyCommand::Add {
            name: "Wind Speed".to_string(),
            data_type: DataTypeArg::Number,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Wind Speed"));
        assert!(debug_str.contains("Number"));
    }
}
