//! Flight property definitions and the values recorded against flights.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::debug;

use super::{datetime_column, format_datetime, on_constraint, Storage};
use crate::error::{Error, Result};
use crate::properties::{
    NewPropertyDefinition, PropertyCatalog, PropertyData, PropertyDataType, PropertyDefinition,
    PropertyValue,
};

impl Storage {
    /// Insert a property definition.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, `Conflict` if the name is
    /// taken, or a database error.
    pub fn insert_property(&self, property: &NewPropertyDefinition) -> Result<PropertyDefinition> {
        property.validate()?;

        self.conn
            .execute(
                "INSERT INTO flight_properties (name, data_type) VALUES (?1, ?2)",
                params![property.name, property.data_type.to_string()],
            )
            .map_err(|e| {
                on_constraint(e, || format!("a property named '{}' exists", property.name))
            })?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted property '{}' with id {}", property.name, id);
        Ok(PropertyDefinition {
            id,
            name: property.name.clone(),
            data_type: property.data_type,
        })
    }

    /// Get a property definition by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_property(&self, id: i64) -> Result<Option<PropertyDefinition>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, data_type FROM flight_properties WHERE id = ?1",
                [id],
                row_to_definition,
            )
            .optional()?;
        Ok(result)
    }

    /// List all property definitions ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_properties(&self) -> Result<Vec<PropertyDefinition>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, data_type FROM flight_properties ORDER BY id")?;
        let properties = stmt
            .query_map([], row_to_definition)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(properties)
    }

    /// Snapshot the property definitions for encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_catalog(&self) -> Result<PropertyCatalog> {
        Ok(PropertyCatalog::new(self.list_properties()?))
    }

    /// Rename a property or change its data type.
    ///
    /// The data type can only change while no flight has a value for the
    /// property.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no property has the id, `Conflict` if the name is
    /// taken or values would change meaning, or a database error.
    pub fn update_property(
        &self,
        id: i64,
        property: &NewPropertyDefinition,
    ) -> Result<PropertyDefinition> {
        property.validate()?;

        let existing = self
            .get_property(id)?
            .ok_or_else(|| Error::not_found("property", id))?;

        if existing.data_type != property.data_type {
            let values: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM flight_property_values WHERE property_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            if values > 0 {
                return Err(Error::conflict(format!(
                    "property '{}' has {values} recorded values; its type cannot change from {} to {}",
                    existing.name, existing.data_type, property.data_type
                )));
            }
        }

        self.conn
            .execute(
                "UPDATE flight_properties SET name = ?1, data_type = ?2 WHERE id = ?3",
                params![property.name, property.data_type.to_string(), id],
            )
            .map_err(|e| {
                on_constraint(e, || format!("a property named '{}' exists", property.name))
            })?;

        Ok(PropertyDefinition {
            id,
            name: property.name.clone(),
            data_type: property.data_type,
        })
    }

    /// Delete a property definition.
    ///
    /// Returns `true` if a definition was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if any flight still has a value for the property.
    pub fn delete_property(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM flight_properties WHERE id = ?1", [id])
            .map_err(|e| on_constraint(e, || format!("property {id} has recorded values")))?;
        Ok(affected > 0)
    }

    /// Record property values for a flight, replacing any earlier value of
    /// the same property.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the flight does not exist, `UnknownProperty` if a
    /// value refers to a deleted property, `Conflict` if a value was encoded
    /// against a data type the property no longer has, or a database error.
    pub fn set_property_values(&self, flight_id: i64, values: &[PropertyValue]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM flights WHERE id = ?1)",
            [flight_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(Error::not_found("flight", flight_id));
        }

        write_property_values(&tx, flight_id, values)?;
        tx.commit()?;
        Ok(())
    }

    /// Property values recorded for a flight, ordered by property id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn property_values(&self, flight_id: i64) -> Result<Vec<PropertyValue>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT p.id, p.name, p.data_type, v.date_value, v.number_value, v.string_value
            FROM flight_property_values v
            JOIN flight_properties p ON p.id = v.property_id
            WHERE v.flight_id = ?1
            ORDER BY p.id
            ",
        )?;
        let values = stmt
            .query_map([flight_id], row_to_value)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Remove one property value from a flight.
    ///
    /// Returns `true` if a value was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_property_value(&self, flight_id: i64, property_id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM flight_property_values WHERE flight_id = ?1 AND property_id = ?2",
            [flight_id, property_id],
        )?;
        Ok(affected > 0)
    }
}

/// Upsert values for a flight on an open connection or transaction.
pub(super) fn write_property_values(
    conn: &Connection,
    flight_id: i64,
    values: &[PropertyValue],
) -> Result<()> {
    for value in values {
        let stored: Option<String> = conn
            .query_row(
                "SELECT data_type FROM flight_properties WHERE id = ?1",
                [value.property_id],
                |row| row.get(0),
            )
            .optional()?;
        let stored = stored.ok_or(Error::UnknownProperty {
            id: value.property_id,
        })?;
        let stored = PropertyDataType::from_str(&stored)?;
        if stored != value.value.data_type() {
            return Err(Error::conflict(format!(
                "property {} is now a {stored} property, not {}",
                value.property_id,
                value.value.data_type()
            )));
        }

        let (date_value, number_value, string_value) = value_slots(&value.value);
        conn.execute(
            r"
            INSERT INTO flight_property_values
                (flight_id, property_id, date_value, number_value, string_value)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (flight_id, property_id) DO UPDATE SET
                date_value = excluded.date_value,
                number_value = excluded.number_value,
                string_value = excluded.string_value
            ",
            params![
                flight_id,
                value.property_id,
                date_value,
                number_value,
                string_value
            ],
        )?;
    }
    Ok(())
}

/// Split a value into its date, number and string columns.
fn value_slots(value: &PropertyData) -> (Option<String>, Option<String>, Option<String>) {
    match value {
        PropertyData::Date(d) => (Some(format_datetime(d)), None, None),
        PropertyData::Number(n) => (None, Some(n.to_string()), None),
        PropertyData::String(s) => (None, None, Some(s.clone())),
    }
}

fn data_type_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<PropertyDataType> {
    let text: String = row.get(idx)?;
    PropertyDataType::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.to_string().into()))
}

fn row_to_definition(row: &rusqlite::Row) -> rusqlite::Result<PropertyDefinition> {
    Ok(PropertyDefinition {
        id: row.get(0)?,
        name: row.get(1)?,
        data_type: data_type_column(row, 2)?,
    })
}

fn row_to_value(row: &rusqlite::Row) -> rusqlite::Result<PropertyValue> {
    let definition = row_to_definition(row)?;
    let value = match definition.data_type {
        PropertyDataType::Date => PropertyData::Date(datetime_column(row, 3)?),
        PropertyDataType::Number => {
            let text: String = row.get(4)?;
            let number = Decimal::from_str(&text).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?;
            PropertyData::Number(number)
        }
        PropertyDataType::String => PropertyData::String(row.get(5)?),
    };
    Ok(PropertyValue {
        property_id: definition.id,
        definition,
        value,
    })
}
