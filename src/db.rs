//! Session store
//!
//! One row per session id holding the serialized session and the time of
//! the last write. Writes are last-write-wins.

mod schema;

pub use schema::*;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Could not create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Insert or replace the blob for `id`
    pub fn save_session(&self, id: &str, blob: &str) -> DbResult<()> {
        self.save_session_at(id, blob, Utc::now())
    }

    pub fn save_session_at(&self, id: &str, blob: &str, at: DateTime<Utc>) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (id, blob, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET blob = excluded.blob, updated_at = excluded.updated_at",
            params![id, blob, format_datetime(at)],
        )?;
        Ok(())
    }

    pub fn load_session(&self, id: &str) -> DbResult<Option<SessionRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, blob, updated_at FROM sessions WHERE id = ?1",
                params![id],
                parse_session_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Most recently updated sessions first
    pub fn list_recent_sessions(&self, limit: usize) -> DbResult<Vec<SessionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, blob, updated_at FROM sessions
             ORDER BY updated_at DESC, id ASC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], parse_session_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete_session(&self, id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Remove every session, returning how many were deleted
    pub fn clear_sessions(&self) -> DbResult<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM sessions", [])?)
    }
}

fn parse_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        blob: row.get(1)?,
        updated_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

/// Fixed-width UTC so lexical order matches time order
fn format_datetime(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
