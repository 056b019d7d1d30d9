//! Credential Store
//!
//! SQLite-backed persistence for user accounts, universities and job postings.
//! A single connection is shared behind a mutex; every write is a single-row
//! statement, so no cross-row transactions are needed.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE universities (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     name TEXT UNIQUE NOT NULL
//! );
//! CREATE TABLE users (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     username TEXT UNIQUE NOT NULL,
//!     password_hash TEXT NOT NULL,
//!     role TEXT NOT NULL DEFAULT 'regular',
//!     university_id INTEGER REFERENCES universities(id),
//!     created_at TEXT NOT NULL
//! );
//! CREATE TABLE job_postings (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     job_title TEXT NOT NULL,
//!     link TEXT NOT NULL,
//!     university_id INTEGER NOT NULL REFERENCES universities(id)
//! );
//! ```

mod catalog;
mod users;

pub use catalog::JobQuery;

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Storage for users, universities and job postings.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS universities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'regular',
                university_id INTEGER REFERENCES universities(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS job_postings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_title TEXT NOT NULL,
                link TEXT NOT NULL,
                university_id INTEGER NOT NULL REFERENCES universities(id)
            );

            CREATE INDEX IF NOT EXISTS idx_job_postings_university
                ON job_postings(university_id);
            "#,
        )?;

        info!("Credential store schema ready");
        Ok(())
    }
}

/// Errors from the store.
#[derive(Debug)]
pub enum StoreError {
    /// Username already registered
    UsernameTaken(String),
    UserNotFound(i64),
    /// Referenced university id does not exist
    UnknownUniversity(i64),
    /// A persisted row could not be mapped back into a model
    CorruptRow(String),
    Sqlite(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameTaken(name) => write!(f, "Username already exists: {}", name),
            Self::UserNotFound(id) => write!(f, "User not found: {}", id),
            Self::UnknownUniversity(id) => write!(f, "University not found: {}", id),
            Self::CorruptRow(msg) => write!(f, "Corrupt row: {}", msg),
            Self::Sqlite(e) => write!(f, "SQLite error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

/// True when SQLite rejected a write on a UNIQUE/foreign-key/NOT NULL constraint.
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_schema_is_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        let store = Store::new(&path).unwrap();
        store.add_university("UQ").unwrap();
        drop(store);

        // Reopening must keep existing rows
        let store = Store::new(&path).unwrap();
        assert_eq!(store.list_universities().unwrap().len(), 1);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::UsernameTaken("alice".into()).to_string(),
            "Username already exists: alice"
        );
        assert_eq!(StoreError::UserNotFound(3).to_string(), "User not found: 3");
    }
}
