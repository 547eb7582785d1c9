//! Operator records.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{date_column, format_date, on_constraint, Storage};
use crate::error::{Error, Result};
use crate::model::{NewOperator, Operator};

const SELECT_OPERATOR: &str = r"
SELECT id, first_names, surname, date_of_birth, flyer_number, operator_number
FROM operators
";

impl Storage {
    /// Insert an operator.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, `Conflict` if the operator
    /// number is taken, or a database error.
    pub fn insert_operator(&self, operator: &NewOperator) -> Result<Operator> {
        operator.validate()?;

        self.conn
            .execute(
                r"
                INSERT INTO operators (first_names, surname, date_of_birth, flyer_number, operator_number)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    operator.first_names,
                    operator.surname,
                    format_date(&operator.date_of_birth),
                    operator.flyer_number,
                    operator.operator_number,
                ],
            )
            .map_err(|e| {
                on_constraint(e, || {
                    format!("operator number '{}' is already registered", operator.operator_number)
                })
            })?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted operator with id {}", id);
        self.get_operator(id)?
            .ok_or_else(|| Error::internal(format!("operator {id} vanished after insert")))
    }

    /// Get an operator by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_operator(&self, id: i64) -> Result<Option<Operator>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_OPERATOR} WHERE id = ?1"),
                [id],
                Self::row_to_operator,
            )
            .optional()?;
        Ok(result)
    }

    /// Find an operator by operator number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_operator_by_number(&self, operator_number: &str) -> Result<Option<Operator>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_OPERATOR} WHERE operator_number = ?1"),
                [operator_number],
                Self::row_to_operator,
            )
            .optional()?;
        Ok(result)
    }

    /// List all operators ordered by surname.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_operators(&self) -> Result<Vec<Operator>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_OPERATOR} ORDER BY surname, first_names, id"
        ))?;
        let operators = stmt
            .query_map([], Self::row_to_operator)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(operators)
    }

    /// Replace an operator's details.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no operator has the id, `Conflict` if the new
    /// operator number is taken, or a validation/database error.
    pub fn update_operator(&self, id: i64, operator: &NewOperator) -> Result<Operator> {
        operator.validate()?;

        let affected = self
            .conn
            .execute(
                r"
                UPDATE operators
                SET first_names = ?1, surname = ?2, date_of_birth = ?3,
                    flyer_number = ?4, operator_number = ?5
                WHERE id = ?6
                ",
                params![
                    operator.first_names,
                    operator.surname,
                    format_date(&operator.date_of_birth),
                    operator.flyer_number,
                    operator.operator_number,
                    id,
                ],
            )
            .map_err(|e| {
                on_constraint(e, || {
                    format!("operator number '{}' is already registered", operator.operator_number)
                })
            })?;

        if affected == 0 {
            return Err(Error::not_found("operator", id));
        }
        self.get_operator(id)?
            .ok_or_else(|| Error::not_found("operator", id))
    }

    /// Delete an operator.
    ///
    /// Returns `true` if an operator was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the operator has logged flights.
    pub fn delete_operator(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM operators WHERE id = ?1", [id])
            .map_err(|e| on_constraint(e, || format!("operator {id} has logged flights")))?;
        Ok(affected > 0)
    }

    fn row_to_operator(row: &rusqlite::Row) -> rusqlite::Result<Operator> {
        Ok(Operator {
            id: row.get(0)?,
            first_names: row.get(1)?,
            surname: row.get(2)?,
            date_of_birth: date_column(row, 3)?,
            flyer_number: row.get(4)?,
            operator_number: row.get(5)?,
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
        let operator = storage.insert_operator(&new_operator("GBR-OP-1")).unwrap();

        let retrieved = storage.get_operator(operator.id).unwrap().unwrap();
        assert_eq!(retrieved, operator);
        assert_eq!(retrieved.operator_number, "GBR-OP-1");
    }

    #[test]
    fn test_get_nonexistent() {
        assert!(storage().get_operator(99999).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_operator_number() {
        let storage = storage();
        storage.insert_operator(&new_operator("GBR-OP-1")).unwrap();

        let err = storage
            .insert_operator(&new_operator("GBR-OP-1"))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_find_by_number() {
        let storage = storage();
        let operator = storage.insert_operator(&new_operator("GBR-OP-7")).unwrap();

        let found = storage.find_operator_by_number("GBR-OP-7").unwrap();
        assert_eq!(found.map(|o| o.id), Some(operator.id));
        assert!(storage.find_operator_by_number("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_operators() {
        let storage = storage();
        let mut second = new_operator("B");
        second.surname = "Bleriot".to_string();
        storage.insert_operator(&new_operator("A")).unwrap();
        storage.insert_operator(&second).unwrap();

        let names: Vec<String> = storage
            .list_operators()
            .unwrap()
            .into_iter()
            .map(|o| o.surname)
            .collect();
        assert_eq!(names, vec!["Bleriot", "Earhart"]);
    }

    #[test]
    fn test_update_operator() {
        let storage = storage();
        let operator = storage.insert_operator(&new_operator("A")).unwrap();

        let mut changed = new_operator("A");
        changed.surname = "Putnam".to_string();
        let updated = storage.update_operator(operator.id, &changed).unwrap();
        assert_eq!(updated.surname, "Putnam");
        assert_eq!(updated.id, operator.id);
    }

    #[test]
    fn test_update_nonexistent() {
        let err = storage()
            .update_operator(42, &new_operator("A"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_insert_invalid() {
        let mut operator = new_operator("A");
        operator.surname = String::new();
        let err = storage().insert_operator(&operator).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_delete_operator() {
        let storage = storage();
        let operator = storage.insert_operator(&new_operator("A")).unwrap();

        assert!(storage.delete_operator(operator.id).unwrap());
        assert!(!storage.delete_operator(operator.id).unwrap());
    }

    #[test]
    fn test_delete_operator_with_flights() {
        let storage = storage();
        let (operator, drone) = seed(&storage);
        storage
            .insert_flight(
                &new_flight(&operator, &drone, "2023-05-01 10:00", "2023-05-01 10:20"),
                &[],
            )
            .unwrap();

        let err = storage.delete_operator(operator.id).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }
}
