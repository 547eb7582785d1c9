//! `flightlog` - A logbook for drone flights
//!
//! This library stores operators, drones and flights in `SQLite`, lets each
//! flight carry custom typed properties, serves the logbook over a JSON API
//! and imports flights from CSV files.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod model;
pub mod properties;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Drone, Flight, FlightFilter, NewDrone, NewFlight, NewOperator, Operator, User};
pub use properties::{PropertyCodec, PropertyData, PropertyDataType, PropertyDefinition, PropertyValue};
pub use storage::{Storage, StorageStats};
