//! User account persistence

use super::{is_constraint_violation, Store, StoreError};
use crate::auth::models::{User, UserRole};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

const USER_COLUMNS: &str = "id, username, password_hash, role, university_id, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(User, String)> {
    let role_str: String = row.get(3)?;
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: UserRole::Regular,
            university_id: row.get(4)?,
            created_at: row.get(5)?,
        },
        role_str,
    ))
}

/// Resolve the stored role string; an unknown value means the row was written
/// by something other than this service.
fn finish_user((mut user, role_str): (User, String)) -> Result<User, StoreError> {
    user.role = UserRole::parse(&role_str).ok_or_else(|| {
        StoreError::CorruptRow(format!("user {} has unknown role '{}'", user.id, role_str))
    })?;
    Ok(user)
}

impl Store {
    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                user_from_row,
            )
            .optional()?;
        raw.map(finish_user).transpose()
    }

    /// Get user by id
    pub fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![user_id],
                user_from_row,
            )
            .optional()?;
        raw.map(finish_user).transpose()
    }

    pub fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a new user with an already-hashed password.
    ///
    /// The UNIQUE constraint on `username` is the final arbiter: a concurrent
    /// registration that slipped past a pre-check still fails with
    /// [`StoreError::UsernameTaken`].
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, StoreError> {
        let created_at = Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO users (username, password_hash, role, university_id, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4)",
            params![username, password_hash, role.as_str(), created_at],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(StoreError::UsernameTaken(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let user = User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            university_id: None,
            created_at,
        };

        info!("Created user: {} ({})", user.username, user.role);

        Ok(user)
    }

    /// List all users, oldest first
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;

        let raw = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(finish_user).collect()
    }

    /// Set a user's role and university affiliation.
    pub fn update_user_access(
        &self,
        user_id: i64,
        role: UserRole,
        university_id: Option<i64>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        if let Some(uni) = university_id {
            let exists: Option<i64> = conn
                .query_row("SELECT id FROM universities WHERE id = ?1", params![uni], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::UnknownUniversity(uni));
            }
        }

        let rows_affected = conn.execute(
            "UPDATE users SET role = ?1, university_id = ?2 WHERE id = ?3",
            params![role.as_str(), university_id, user_id],
        )?;

        if rows_affected == 0 {
            return Err(StoreError::UserNotFound(user_id));
        }

        info!(
            "Updated user {}: role={} university_id={:?}",
            user_id, role, university_id
        );
        Ok(())
    }

    pub fn count_users_with_role(&self, role: UserRole) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
