//! Drone records.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{on_constraint, Storage};
use crate::error::{Error, Result};
use crate::model::{Drone, NewDrone};

const SELECT_DRONE: &str = "SELECT id, name, make, model, serial_number FROM drones";

impl Storage {
    /// Insert a drone.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, `Conflict` if the name is
    /// taken, or a database error.
    pub fn insert_drone(&self, drone: &NewDrone) -> Result<Drone> {
        drone.validate()?;

        self.conn
            .execute(
                "INSERT INTO drones (name, make, model, serial_number) VALUES (?1, ?2, ?3, ?4)",
                params![drone.name, drone.make, drone.model, drone.serial_number],
            )
            .map_err(|e| on_constraint(e, || format!("a drone named '{}' exists", drone.name)))?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted drone with id {}", id);
        Ok(Drone {
            id,
            name: drone.name.clone(),
            make: drone.make.clone(),
            model: drone.model.clone(),
            serial_number: drone.serial_number.clone(),
        })
    }

    /// Get a drone by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_drone(&self, id: i64) -> Result<Option<Drone>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_DRONE} WHERE id = ?1"),
                [id],
                Self::row_to_drone,
            )
            .optional()?;
        Ok(result)
    }

    /// Find a drone by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_drone_by_name(&self, name: &str) -> Result<Option<Drone>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_DRONE} WHERE name = ?1"),
                [name],
                Self::row_to_drone,
            )
            .optional()?;
        Ok(result)
    }

    /// List all drones ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_drones(&self) -> Result<Vec<Drone>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_DRONE} ORDER BY name"))?;
        let drones = stmt
            .query_map([], Self::row_to_drone)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(drones)
    }

    /// Replace a drone's details.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no drone has the id, `Conflict` if the new name
    /// is taken, or a validation/database error.
    pub fn update_drone(&self, id: i64, drone: &NewDrone) -> Result<Drone> {
        drone.validate()?;

        let affected = self
            .conn
            .execute(
                "UPDATE drones SET name = ?1, make = ?2, model = ?3, serial_number = ?4 WHERE id = ?5",
                params![drone.name, drone.make, drone.model, drone.serial_number, id],
            )
            .map_err(|e| on_constraint(e, || format!("a drone named '{}' exists", drone.name)))?;

        if affected == 0 {
            return Err(Error::not_found("drone", id));
        }
        self.get_drone(id)?.ok_or_else(|| Error::not_found("drone", id))
    }

    /// Delete a drone.
    ///
    /// Returns `true` if a drone was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the drone has logged flights.
    pub fn delete_drone(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM drones WHERE id = ?1", [id])
            .map_err(|e| on_constraint(e, || format!("drone {id} has logged flights")))?;
        Ok(affected > 0)
    }

    fn row_to_drone(row: &rusqlite::Row) -> rusqlite::Result<Drone> {
        Ok(Drone {
            id: row.get(0)?,
            name: row.get(1)?,
            make: row.get(2)?,
            model: row.get(3)?,
            serial_number: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::storage::test_support::*;

    #[test]
    fn test_insert_and_get() {
        let storage = storage();
        let drone = storage.insert_drone(&new_drone("Mavic")).unwrap();

        let retrieved = storage.get_drone(drone.id).unwrap().unwrap();
        assert_eq!(retrieved, drone);
        assert_eq!(retrieved.make, "DJI");
    }

    #[test]
    fn test_duplicate_name() {
        let storage = storage();
        storage.insert_drone(&new_drone("Mavic")).unwrap();

        let err = storage.insert_drone(&new_drone("Mavic")).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_find_by_name() {
        let storage = storage();
        let drone = storage.insert_drone(&new_drone("Mini")).unwrap();

        assert_eq!(
            storage.find_drone_by_name("Mini").unwrap().map(|d| d.id),
            Some(drone.id)
        );
        assert!(storage.find_drone_by_name("mini").unwrap().is_none());
    }

    #[test]
    fn test_list_drones_sorted() {
        let storage = storage();
        storage.insert_drone(&new_drone("Phantom")).unwrap();
        storage.insert_drone(&new_drone("Air")).unwrap();

        let names: Vec<String> = storage
            .list_drones()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Air", "Phantom"]);
    }

    #[test]
    fn test_update_drone() {
        let storage = storage();
        let drone = storage.insert_drone(&new_drone("Mavic")).unwrap();

        let mut changed = new_drone("Mavic Pro");
        changed.serial_number = "NEW".to_string();
        let updated = storage.update_drone(drone.id, &changed).unwrap();
        assert_eq!(updated.name, "Mavic Pro");
        assert_eq!(updated.serial_number, "NEW");
    }

    #[test]
    fn test_update_to_taken_name() {
        let storage = storage();
        storage.insert_drone(&new_drone("Mavic")).unwrap();
        let other = storage.insert_drone(&new_drone("Mini")).unwrap();

        let err = storage
            .update_drone(other.id, &new_drone("Mavic"))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_delete_drone() {
        let storage = storage();
        let drone = storage.insert_drone(&new_drone("Mavic")).unwrap();

        assert!(storage.delete_drone(drone.id).unwrap());
        assert!(storage.get_drone(drone.id).unwrap().is_none());
        assert!(!storage.delete_drone(drone.id).unwrap());
    }
}
