//! Flight records.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use super::properties::write_property_values;
use super::{datetime_column, format_datetime, Storage};
use crate::error::{Error, Result};
use crate::model::{Flight, FlightFilter, NewFlight};
use crate::properties::PropertyValue;

const SELECT_FLIGHT: &str = r"
SELECT id, drone_id, operator_id, location, start_time, end_time
FROM flights
";

impl Storage {
    /// Insert a flight together with its property values.
    ///
    /// The flight and its values are written in one transaction: either all
    /// of them are stored or none.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid flight, `NotFound` if the
    /// drone or operator does not exist, `UnknownProperty` for a value of a
    /// deleted property, or a database error.
    pub fn insert_flight(&self, flight: &NewFlight, values: &[PropertyValue]) -> Result<Flight> {
        flight.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        require_references(&tx, flight)?;

        tx.execute(
            r"
            INSERT INTO flights (drone_id, operator_id, location, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                flight.drone_id,
                flight.operator_id,
                flight.location,
                format_datetime(&flight.start),
                format_datetime(&flight.end),
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_property_values(&tx, id, values)?;
        tx.commit()?;

        debug!("Inserted flight {} with {} property values", id, values.len());
        self.get_flight(id)?
            .ok_or_else(|| Error::internal(format!("flight {id} vanished after insert")))
    }

    /// Get a flight and its property values by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_flight(&self, id: i64) -> Result<Option<Flight>> {
        let flight = self
            .conn
            .query_row(
                &format!("{SELECT_FLIGHT} WHERE id = ?1"),
                [id],
                Self::row_to_flight,
            )
            .optional()?;

        match flight {
            Some(mut flight) => {
                flight.properties = self.property_values(flight.id)?;
                Ok(Some(flight))
            }
            None => Ok(None),
        }
    }

    /// List flights matching a filter, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_flights(&self, filter: &FlightFilter) -> Result<Vec<Flight>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(operator_id) = filter.operator_id {
            values.push(Value::Integer(operator_id));
            conditions.push(format!("operator_id = ?{}", values.len()));
        }
        if let Some(drone_id) = filter.drone_id {
            values.push(Value::Integer(drone_id));
            conditions.push(format!("drone_id = ?{}", values.len()));
        }
        if let Some(location) = &filter.location {
            values.push(Value::Text(location.clone()));
            conditions.push(format!("location = ?{}", values.len()));
        }
        if let Some(from) = &filter.from {
            values.push(Value::Text(format_datetime(from)));
            conditions.push(format!("start_time >= ?{}", values.len()));
        }
        if let Some(to) = &filter.to {
            values.push(Value::Text(format_datetime(to)));
            conditions.push(format!("start_time <= ?{}", values.len()));
        }

        let mut sql = SELECT_FLIGHT.to_string();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY start_time DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut flights = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_flight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for flight in &mut flights {
            flight.properties = self.property_values(flight.id)?;
        }
        Ok(flights)
    }

    /// Replace a flight's details. Property values are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the flight, drone or operator does not exist, or
    /// a validation/database error.
    pub fn update_flight(&self, id: i64, flight: &NewFlight) -> Result<Flight> {
        flight.validate()?;
        require_references(&self.conn, flight)?;

        let affected = self.conn.execute(
            r"
            UPDATE flights
            SET drone_id = ?1, operator_id = ?2, location = ?3, start_time = ?4, end_time = ?5
            WHERE id = ?6
            ",
            params![
                flight.drone_id,
                flight.operator_id,
                flight.location,
                format_datetime(&flight.start),
                format_datetime(&flight.end),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(Error::not_found("flight", id));
        }
        self.get_flight(id)?
            .ok_or_else(|| Error::not_found("flight", id))
    }

    /// Delete a flight and its property values.
    ///
    /// Returns `true` if a flight was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_flight(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM flights WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    fn row_to_flight(row: &rusqlite::Row) -> rusqlite::Result<Flight> {
        Ok(Flight {
            id: row.get(0)?,
            drone_id: row.get(1)?,
            operator_id: row.get(2)?,
            location: row.get(3)?,
            start: datetime_column(row, 4)?,
            end: datetime_column(row, 5)?,
            properties: Vec::new(),
        })
    }
}

/// Fail with `NotFound` unless the flight's drone and operator exist.
fn require_references(conn: &Connection, flight: &NewFlight) -> Result<()> {
    let exists = |table: &str, id: i64| -> Result<bool> {
        let found: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
            [id],
            |row| row.get(0),
        )?;
        Ok(found)
    };

    if !exists("drones", flight.drone_id)? {
        return Err(Error::not_found("drone", flight.drone_id));
    }
    if !exists("operators", flight.operator_id)? {
        return Err(Error::not_found("operator", flight.operator_id));
    }
    Ok(())
}
