//! Application users.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{on_constraint, timestamp_column, Storage};
use crate::error::{Error, Result};
use crate::model::{NewUser, User};

impl Storage {
    /// Insert a user, stamping the creation time.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad name, `Conflict` if the name is
    /// taken, or a database error.
    pub fn insert_user(&self, user: &NewUser) -> Result<User> {
        user.validate()?;

        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO users (user_name, created_at) VALUES (?1, ?2)",
                params![
                    user.user_name,
                    created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
                ],
            )
            .map_err(|e| on_constraint(e, || format!("user '{}' exists", user.user_name)))?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted user '{}' with id {}", user.user_name, id);
        self.get_user(id)?
            .ok_or_else(|| Error::internal(format!("user {id} vanished after insert")))
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, user_name, created_at FROM users WHERE id = ?1",
                [id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(result)
    }

    /// List all users ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, user_name, created_at FROM users ORDER BY user_name")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Delete a user.
    ///
    /// Returns `true` if a user was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            user_name: row.get(1)?,
            created_at: timestamp_column(row, 2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::error::Error;
    use crate::model::NewUser;
    use crate::storage::test_support::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            user_name: name.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let storage = storage();
        let before = Utc::now();
        let user = storage.insert_user(&new_user("pilot1")).unwrap();

        let retrieved = storage.get_user(user.id).unwrap().unwrap();
        assert_eq!(retrieved, user);
        assert!(retrieved.created_at >= before - chrono::TimeDelta::seconds(1));
    }

    #[test]
    fn test_duplicate_user() {
        let storage = storage();
        storage.insert_user(&new_user("pilot1")).unwrap();

        let err = storage.insert_user(&new_user("pilot1")).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_invalid_user_name() {
        let err = storage().insert_user(&new_user("two words")).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_list_and_delete() {
        let storage = storage();
        let zed = storage.insert_user(&new_user("zed")).unwrap();
        storage.insert_user(&new_user("amy")).unwrap();

        let names: Vec<String> = storage
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.user_name)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);

        assert!(storage.delete_user(zed.id).unwrap());
        assert!(!storage.delete_user(zed.id).unwrap());
        assert_eq!(storage.list_users().unwrap().len(), 1);
    }
}
