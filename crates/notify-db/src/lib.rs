//! SQLite persistence for notification state.
//!
//! Holds three independent namespaces (seen positions, pending message
//! entries, disabled targets) plus the daemon's settings table.

pub mod disableds;
pub mod messages;
pub mod positions;
pub mod schema;
pub mod settings;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub use disableds::DisabledTarget;
pub use messages::{PendingMap, StoredEntry};
pub use settings::{SettingSource, StoredSetting};

/// Handle to the notification state file. Clones share one connection, so
/// every write from the aggregator and the settings layer is serialized.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the state file at `path`, creating tables on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.configure()?;
        db.migrate()?;
        tracing::debug!(path = %path.display(), "Notification database ready");
        Ok(db)
    }

    /// Throwaway state: nothing survives the handle.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.configure()?;
        db.migrate()?;
        Ok(db)
    }

    /// Run `f` with the connection locked.
    pub fn with_conn<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Connection) -> Result<R, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }

    /// Like [`Database::with_conn`], for callers that open a transaction.
    pub fn with_conn_mut<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&mut Connection) -> Result<R, DbError>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&mut conn)
    }

    fn configure(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA busy_timeout=5000;",
            )?;
            Ok(())
        })
    }

    fn migrate(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            schema::run_migrations(conn)?;
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Notification database lock poisoned")]
    LockPoisoned,

    /// A stored row could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
