//! CSV import of flight records.
//!
//! Each data row of a CSV file becomes one flight. The drone, operator,
//! location, start and end columns are found by header name (see
//! [`ImportConfig`]); any other header that names a flight property becomes
//! a [`FlightPropertyField`]. A row that fails is reported with its line
//! number and the import carries on with the next row.
//!
//! Files are fingerprinted with BLAKE3 so the same file is not imported
//! twice by accident.

mod fields;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::error::{Error, Result};
use crate::model::NewFlight;
use crate::properties::{PropertyCatalog, PropertyCodec, PropertyValue};
use crate::storage::Storage;

pub use fields::{CsvField, FlightPropertyField};

/// Options for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Validate every row without writing anything.
    pub dry_run: bool,
    /// Import even if the file was imported before.
    pub force: bool,
}

/// A row that could not be imported.
#[derive(Debug, Serialize)]
pub struct RowFailure {
    /// 1-based line number in the file.
    pub line: u64,
    /// What went wrong.
    #[serde(serialize_with = "serialize_error")]
    pub error: Error,
}

fn serialize_error<S: serde::Serializer>(
    error: &Error,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of an import run.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    /// The file (or source) name.
    pub file_name: String,
    /// Data rows read, excluding the header.
    pub rows_read: u64,
    /// Rows that mapped to a valid flight.
    pub rows_accepted: u64,
    /// Ids of the flights created. Empty for a dry run.
    pub flights: Vec<i64>,
    /// Rows that failed.
    pub failures: Vec<RowFailure>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl ImportReport {
    /// Check if every row was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Column layout of one import file, resolved from its header row.
#[derive(Debug, Clone)]
pub struct ImportColumns {
    drone: CsvField,
    operator: CsvField,
    location: CsvField,
    start: CsvField,
    end: CsvField,
    properties: Vec<FlightPropertyField>,
    ignored: Vec<String>,
}

impl ImportColumns {
    /// Resolve the columns of a file from its headers.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a flight column is missing or a header
    /// appears twice.
    pub fn resolve<S: AsRef<str>>(
        headers: &[S],
        config: &ImportConfig,
        catalog: &PropertyCatalog,
    ) -> Result<Self> {
        let mut seen = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            if seen.insert(header.as_ref(), index).is_some() {
                return Err(Error::validation(format!(
                    "column '{}' appears more than once",
                    header.as_ref()
                )));
            }
        }

        let column = |name: &str| -> Result<CsvField> {
            seen.get(name)
                .map(|&index| CsvField::new(name, index))
                .ok_or_else(|| Error::validation(format!("missing required column '{name}'")))
        };

        let reserved = config.reserved_columns();
        let mut properties = Vec::new();
        let mut ignored = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            let header = header.as_ref();
            if reserved.contains(&header) {
                continue;
            }
            match catalog.by_name(header) {
                Some(definition) => properties.push(FlightPropertyField::new(
                    CsvField::new(header, index),
                    definition.clone(),
                )),
                None => ignored.push(header.to_string()),
            }
        }

        Ok(Self {
            drone: column(&config.drone_column)?,
            operator: column(&config.operator_column)?,
            location: column(&config.location_column)?,
            start: column(&config.start_column)?,
            end: column(&config.end_column)?,
            properties,
            ignored,
        })
    }

    /// Property columns, in header order.
    #[must_use]
    pub fn properties(&self) -> &[FlightPropertyField] {
        &self.properties
    }

    /// Headers that are neither flight columns nor known properties.
    #[must_use]
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}

/// Imports CSV files into the logbook.
#[derive(Debug)]
pub struct Importer<'a> {
    storage: &'a Storage,
    codec: &'a PropertyCodec,
    config: &'a ImportConfig,
}

impl<'a> Importer<'a> {
    /// Create an importer writing to the given storage.
    #[must_use]
    pub fn new(storage: &'a Storage, codec: &'a PropertyCodec, config: &'a ImportConfig) -> Self {
        Self {
            storage,
            codec,
            config,
        }
    }

    /// Import a file.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyImported` if a file with the same contents was
    /// imported before and `force` is not set. Returns an I/O, CSV or
    /// validation error if the file or its header cannot be read. Errors in
    /// individual rows are reported in the [`ImportReport`] instead.
    pub fn import_file(&self, path: &Path, options: ImportOptions) -> Result<ImportReport> {
        let contents = std::fs::read(path)?;
        let content_hash = blake3::hash(&contents).to_hex().to_string();
        debug!("{} has fingerprint {}", path.display(), content_hash);

        if !options.force {
            if let Some(run) = self.storage.find_import_by_hash(&content_hash)? {
                return Err(Error::AlreadyImported {
                    path: path.to_path_buf(),
                    imported_at: run.imported_at.to_rfc3339(),
                });
            }
        }

        let file_name = path.display().to_string();
        let report = self.import_reader(contents.as_slice(), &file_name, options.dry_run)?;

        if !options.dry_run {
            self.storage.record_import(
                &file_name,
                &content_hash,
                report.flights.len() as u64,
                report.failures.len() as u64,
            )?;
        }
        Ok(report)
    }

    /// Import CSV data from a reader.
    ///
    /// # Errors
    ///
    /// Returns a CSV or validation error if the header cannot be read or a
    /// flight column is missing, or a database error.
    pub fn import_reader<R: Read>(
        &self,
        reader: R,
        file_name: &str,
        dry_run: bool,
    ) -> Result<ImportReport> {
        let mut csv = ReaderBuilder::new()
            .delimiter(self.config.delimiter_byte())
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(ToString::to_string).collect();
        let catalog = self.storage.load_catalog()?;
        let columns = ImportColumns::resolve(&headers, self.config, &catalog)?;
        if !columns.ignored().is_empty() {
            info!(
                "Ignoring columns without a matching property: {}",
                columns.ignored().join(", ")
            );
        }

        let mut report = ImportReport {
            file_name: file_name.to_string(),
            rows_read: 0,
            rows_accepted: 0,
            flights: Vec::new(),
            failures: Vec::new(),
            dry_run,
        };
        let mut lookups = Lookups::default();

        for result in csv.records() {
            report.rows_read += 1;
            let outcome = match result {
                Ok(record) => {
                    let line = record.position().map_or(0, csv::Position::line);
                    (line, self.import_record(&record, &columns, &mut lookups, dry_run))
                }
                Err(e) => (e.position().map_or(0, csv::Position::line), Err(e.into())),
            };

            match outcome {
                (_, Ok(flight)) => {
                    report.rows_accepted += 1;
                    report.flights.extend(flight);
                }
                (line, Err(error)) => {
                    warn!("Line {} of {} skipped: {}", line, file_name, error);
                    report.failures.push(RowFailure { line, error });
                }
            }
        }

        info!(
            "{} {}: {} of {} rows accepted, {} failed",
            if dry_run { "Checked" } else { "Imported" },
            file_name,
            report.rows_accepted,
            report.rows_read,
            report.failures.len()
        );
        Ok(report)
    }

    /// Map one record to a flight and store it unless this is a dry run.
    fn import_record(
        &self,
        record: &StringRecord,
        columns: &ImportColumns,
        lookups: &mut Lookups,
        dry_run: bool,
    ) -> Result<Option<i64>> {
        let row: Vec<&str> = record.iter().collect();

        let drone_name = columns.drone.raw(&row)?.trim();
        let drone_id = lookups.drone(self.storage, drone_name)?;
        let operator_number = columns.operator.raw(&row)?.trim();
        let operator_id = lookups.operator(self.storage, operator_number)?;

        let flight = NewFlight {
            drone_id,
            operator_id,
            location: columns.location.raw(&row)?.trim().to_string(),
            start: columns
                .start
                .parse_with(&row, |raw| self.codec.parse_date(&columns.start.name, raw))?,
            end: columns
                .end
                .parse_with(&row, |raw| self.codec.parse_date(&columns.end.name, raw))?,
        };

        let values = columns
            .properties
            .iter()
            .filter_map(|field| field.recorded_value(&row, self.codec).transpose())
            .collect::<Result<Vec<PropertyValue>>>()?;

        if dry_run {
            flight.validate()?;
            return Ok(None);
        }
        let stored = self.storage.insert_flight(&flight, &values)?;
        Ok(Some(stored.id))
    }
}

/// Drone and operator ids already looked up during one run.
#[derive(Debug, Default)]
struct Lookups {
    drones: HashMap<String, i64>,
    operators: HashMap<String, i64>,
}

impl Lookups {
    fn drone(&mut self, storage: &Storage, name: &str) -> Result<i64> {
        if let Some(&id) = self.drones.get(name) {
            return Ok(id);
        }
        let drone = storage
            .find_drone_by_name(name)?
            .ok_or_else(|| Error::not_found("drone", name))?;
        self.drones.insert(name.to_string(), drone.id);
        Ok(drone.id)
    }

    fn operator(&mut self, storage: &Storage, number: &str) -> Result<i64> {
        if let Some(&id) = self.operators.get(number) {
            return Ok(id);
        }
        let operator = storage
            .find_operator_by_number(number)?
            .ok_or_else(|| Error::not_found("operator", number))?;
        self.operators.insert(number.to_string(), operator.id);
        Ok(operator.id)
    }
}
