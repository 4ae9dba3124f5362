//! Database layer for the todo service.
//!
//! A single SQLite connection behind a mutex. Every read and write goes through
//! [`Database::with_conn`] or [`Database::with_conn_mut`], so concurrent request
//! handlers and scheduler loops are serialized on the connection, and
//! multi-statement operations run inside one transaction.

pub mod scheduled_tasks;
pub mod tasks;
pub mod tree;

use crate::error::ServiceError;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Default cap on rows returned by list queries.
pub const DEFAULT_RESULTS_LIMIT: usize = 200;

/// Database handle wrapping a SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
    max_results: usize,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Mutex::new(conn),
            max_results: DEFAULT_RESULTS_LIMIT,
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Mutex::new(conn),
            max_results: DEFAULT_RESULTS_LIMIT,
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Set the cap on rows returned by list queries. Zero is treated as one.
    pub fn with_results_limit(mut self, limit: usize) -> Self {
        self.max_results = limit.max(1);
        self
    }

    /// The configured cap on rows returned by list queries.
    pub fn results_limit(&self) -> usize {
        self.max_results
    }

    /// Clamp a requested page size: zero or anything above the cap becomes the cap.
    pub fn clamp_limit(&self, limit: usize) -> usize {
        if limit == 0 || limit > self.max_results {
            self.max_results
        } else {
            limit
        }
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            embedded::migrations::runner().run(conn)?;
            Ok(())
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        f(&mut conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Translate a primary key violation into an `AlreadyExists` error.
pub(crate) fn map_insert_error(err: rusqlite::Error, entity: &str, id: &str) -> anyhow::Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ServiceError::already_exists(entity, id).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_caps_zero_and_oversized_requests() {
        let db = Database::open_in_memory().unwrap().with_results_limit(200);
        assert_eq!(db.clamp_limit(0), 200);
        assert_eq!(db.clamp_limit(100_000), 200);
        assert_eq!(db.clamp_limit(25), 25);
    }

    #[test]
    fn migrations_create_both_tables() {
        let db = Database::open_in_memory().unwrap();
        let tables: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'table' AND name NOT LIKE 'refinery_%'
                     ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .unwrap();
        assert_eq!(tables, vec!["scheduled_tasks", "tasks"]);
    }

    #[test]
    fn open_on_disk_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_task(&crate::types::Task::new("persisted", "", ""))
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_tasks(0, 0, false).unwrap().len(), 1);
    }
}
