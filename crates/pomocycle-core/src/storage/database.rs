//! SQLite-based session storage.
//!
//! Every append is a single committed INSERT with `synchronous = FULL`, so a
//! record is on disk by the time [`SessionStore::append`] returns.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::data_dir;
use super::migrations;
use super::session::{SessionRecord, SessionStore, DATE_FORMAT, TIME_FORMAT};
use crate::error::PersistenceError;

/// SQLite database holding completed sessions.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `<data dir>/sessions.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> crate::Result<Self> {
        let path = data_dir()?.join("sessions.db");
        Ok(Self::open_at(path)?)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| PersistenceError::OpenFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(|e| PersistenceError::OpenFailed {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Self::init(conn, Some(path))
    }

    /// Open an in-memory database (for tests and ephemeral hosts).
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory().map_err(|e| PersistenceError::OpenFailed {
            path: PathBuf::from(":memory:"),
            message: e.to_string(),
        })?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, PersistenceError> {
        migrations::migrate(&conn).map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
        tracing::debug!(path = ?path, "session store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Location on disk, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written in SQLite.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for Database {
    fn append(&self, record: &SessionRecord) -> Result<(), PersistenceError> {
        self.conn()
            .execute(
                "INSERT INTO sessions (date, start_time, duration_minutes)
                 VALUES (?1, ?2, ?3)",
                params![
                    record.date.format(DATE_FORMAT).to_string(),
                    record.start_time.format(TIME_FORMAT).to_string(),
                    record.duration_minutes,
                ],
            )
            .map_err(PersistenceError::from_write)?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, date, start_time, CAST(duration_minutes AS TEXT)
             FROM sessions
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, start_time, minutes) = row?;
            let line = usize::try_from(id).unwrap_or_default();
            records.push(SessionRecord::parse(line, &date, &start_time, &minutes)?);
        }
        Ok(records)
    }
}
