//! Database layer for medicert.

mod certificates;
mod patients;
mod schema;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper with an explicit open/close lifecycle.
///
/// Single-operator model: one connection, synchronous blocking calls,
/// exclusive access to the store file.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating file and schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(&path)?;
        let mut db = Self { conn };
        db.initialize()?;
        tracing::info!(path = %path.as_ref().display(), "store opened");
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema inside one transaction. Safe to call on every
    /// process start.
    fn initialize(&mut self) -> DbResult<()> {
        // foreign_keys cannot be toggled inside a transaction
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        tracing::debug!("schema initialized");
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Map unique-key and foreign-key failures to `DbError::Constraint`;
/// everything else stays a plain SQLite error.
pub(crate) fn map_constraint(err: rusqlite::Error) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => DbError::Sqlite(err),
    }
}
