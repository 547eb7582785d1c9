//! Logbook records.
//!
//! This module defines the operators, drones, flights and users stored in the
//! logbook, together with the payloads used to create or update them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::properties::PropertyValue;

/// A registered drone operator (remote pilot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Given names.
    pub first_names: String,
    /// Family name.
    pub surname: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Flyer ID issued with the competency certificate.
    pub flyer_number: String,
    /// Operator ID, unique per operator.
    pub operator_number: String,
}

impl Operator {
    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.surname)
    }
}

/// Payload for creating or updating an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperator {
    /// Given names.
    pub first_names: String,
    /// Family name.
    pub surname: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Flyer ID.
    pub flyer_number: String,
    /// Operator ID.
    pub operator_number: String,
}

impl NewOperator {
    /// Check the payload before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is blank.
    pub fn validate(&self) -> Result<()> {
        require("first_names", &self.first_names)?;
        require("surname", &self.surname)?;
        require("flyer_number", &self.flyer_number)?;
        require("operator_number", &self.operator_number)
    }
}

/// A drone in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drone {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Name used to refer to the drone, unique in the fleet.
    pub name: String,
    /// Manufacturer.
    pub make: String,
    /// Model designation.
    pub model: String,
    /// Manufacturer serial number.
    pub serial_number: String,
}

/// Payload for creating or updating a drone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrone {
    /// Name, unique in the fleet.
    pub name: String,
    /// Manufacturer.
    pub make: String,
    /// Model designation.
    pub model: String,
    /// Manufacturer serial number.
    pub serial_number: String,
}

impl NewDrone {
    /// Check the payload before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is blank.
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("make", &self.make)?;
        require("model", &self.model)?;
        require("serial_number", &self.serial_number)
    }
}

/// A logged flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Identifier assigned by storage.
    pub id: i64,
    /// The drone flown.
    pub drone_id: i64,
    /// The operator flying it.
    pub operator_id: i64,
    /// Where the flight took place.
    pub location: String,
    /// Take-off time.
    pub start: NaiveDateTime,
    /// Landing time.
    pub end: NaiveDateTime,
    /// Custom property values, ordered by property id.
    #[serde(default)]
    pub properties: Vec<PropertyValue>,
}

impl Flight {
    /// Time in the air.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Payload for creating or updating a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlight {
    /// The drone flown.
    pub drone_id: i64,
    /// The operator flying it.
    pub operator_id: i64,
    /// Where the flight took place.
    pub location: String,
    /// Take-off time.
    pub start: NaiveDateTime,
    /// Landing time.
    pub end: NaiveDateTime,
}

impl NewFlight {
    /// Check the payload before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the location is blank or the flight
    /// lands before it takes off.
    pub fn validate(&self) -> Result<()> {
        require("location", &self.location)?;
        if self.end < self.start {
            return Err(Error::validation(format!(
                "flight ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

/// Filters for listing flights. All filters are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightFilter {
    /// Only flights by this operator.
    pub operator_id: Option<i64>,
    /// Only flights with this drone.
    pub drone_id: Option<i64>,
    /// Only flights at this location (exact match).
    pub location: Option<String>,
    /// Only flights starting at or after this time.
    pub from: Option<NaiveDateTime>,
    /// Only flights starting at or before this time.
    pub to: Option<NaiveDateTime>,
}

/// A user of the logbook application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Login name, unique.
    pub user_name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Login name.
    pub user_name: String,
}

impl NewUser {
    /// Check the payload before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank or contains whitespace.
    pub fn validate(&self) -> Result<()> {
        require("user_name", &self.user_name)?;
        if self.user_name.chars().any(char::is_whitespace) {
            return Err(Error::validation("user_name must not contain whitespace"));
        }
        Ok(())
    }
}

/// A recorded CSV import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRun {
    /// Identifier assigned by storage.
    pub id: i64,
    /// File name as given on the command line.
    pub file_name: String,
    /// BLAKE3 hash of the file contents.
    pub content_hash: String,
    /// When the import ran.
    pub imported_at: DateTime<Utc>,
    /// Rows turned into flights.
    pub rows_imported: u64,
    /// Rows that failed.
    pub rows_failed: u64,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn new_flight(start: &str, end: &str) -> NewFlight {
        NewFlight {
            drone_id: 1,
            operator_id: 1,
            location: "Riverside Park".to_string(),
            start: datetime(start),
            end: datetime(end),
        }
    }

    #[test]
    fn test_new_flight_validate() {
        assert!(new_flight("2023-05-01 10:00", "2023-05-01 10:20")
            .validate()
            .is_ok());
        assert!(new_flight("2023-05-01 10:00", "2023-05-01 10:00")
            .validate()
            .is_ok());

        let err = new_flight("2023-05-01 10:20", "2023-05-01 10:00")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn test_new_flight_blank_location() {
        let mut flight = new_flight("2023-05-01 10:00", "2023-05-01 10:20");
        flight.location = "  ".to_string();
        assert!(flight.validate().is_err());
    }

    #[test]
    fn test_flight_duration() {
        let flight = Flight {
            id: 1,
            drone_id: 1,
            operator_id: 1,
            location: "Beach".to_string(),
            start: datetime("2023-05-01 10:00"),
            end: datetime("2023-05-01 10:25"),
            properties: Vec::new(),
        };
        assert_eq!(flight.duration(), TimeDelta::minutes(25));
    }

    #[test]
    fn test_new_operator_validate() {
        let operator = NewOperator {
            first_names: "Amelia".to_string(),
            surname: "Earhart".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 7, 24).unwrap(),
            flyer_number: "GBR-RP-1234".to_string(),
            operator_number: "GBR-OP-5678".to_string(),
        };
        assert!(operator.validate().is_ok());

        let mut blank = operator;
        blank.operator_number = String::new();
        let err = blank.validate().unwrap_err();
        assert!(err.to_string().contains("operator_number"));
    }

    #[test]
    fn test_operator_full_name() {
        let operator = Operator {
            id: 1,
            first_names: "Amelia Mary".to_string(),
            surname: "Earhart".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 7, 24).unwrap(),
            flyer_number: "F".to_string(),
            operator_number: "O".to_string(),
        };
        assert_eq!(operator.full_name(), "Amelia Mary Earhart");
    }

    #[test]
    fn test_new_drone_validate() {
        let drone = NewDrone {
            name: "Mavic".to_string(),
            make: "DJI".to_string(),
            model: "Mavic 3".to_string(),
            serial_number: "1581F".to_string(),
        };
        assert!(drone.validate().is_ok());

        let mut blank = drone;
        blank.make = " ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_new_user_validate() {
        assert!(NewUser {
            user_name: "pilot1".to_string()
        }
        .validate()
        .is_ok());
        assert!(NewUser {
            user_name: "pilot one".to_string()
        }
        .validate()
        .is_err());
        assert!(NewUser {
            user_name: String::new()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_flight_filter_deserialize_partial() {
        let filter: FlightFilter = serde_json::from_str(r#"{"drone_id": 4}"#).unwrap();
        assert_eq!(filter.drone_id, Some(4));
        assert!(filter.operator_id.is_none());
        assert!(filter.from.is_none());
    }
}
