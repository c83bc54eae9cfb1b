//! Database connection management
//!
//! This module provides the core database connection wrapper used by the schema catalog.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// How long SQLite waits on a locked schema before reporting it busy
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self) -> Result<()> {
        self.set_busy_timeout(BUSY_TIMEOUT)?;

        // Store temp tables in memory
        self.conn
            .execute("PRAGMA temp_store=MEMORY", [])
            .map_err(|e| anyhow!("Failed to set temp store: {}", e))?;

        // Enable foreign keys
        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        Ok(())
    }

    /// Change how long statements wait on a lock held by another connection
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn
            .busy_timeout(timeout)
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Execute a SQL statement with parameters
    pub fn execute_with_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.conn
            .execute(sql, params)
            .map_err(|e| anyhow!("Failed to execute SQL with params: {}", e))
    }

    /// Attach the database file at `path` under the schema name `name`
    ///
    /// Keeps the raw SQLite error so callers can classify it.
    pub fn attach(&self, path: &Path, name: &str) -> rusqlite::Result<()> {
        let path_str = path.to_string_lossy();
        self.conn
            .execute("ATTACH DATABASE ?1 AS ?2", [path_str.as_ref(), name])?;
        Ok(())
    }

    /// Detach a schema, keeping the raw SQLite error so callers can classify it
    pub fn detach(&self, name: &str) -> rusqlite::Result<()> {
        self.conn.execute("DETACH DATABASE ?1", [name])?;
        Ok(())
    }

    /// Take and release the write lock on every attached database
    ///
    /// Fails with `SQLITE_BUSY` while another connection reads from or writes
    /// to one of them.
    pub fn acquire_exclusive(&self) -> rusqlite::Result<()> {
        let result = self.conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;");
        if result.is_err() && !self.conn.is_autocommit() {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
        result
    }

    /// Check if a table exists in the given schema
    pub fn table_exists(&self, schema: &str, table_name: &str) -> Result<bool> {
        let query = format!(
            "SELECT COUNT(*) FROM \"{}\".sqlite_master WHERE type='table' AND name=?1",
            schema
        );
        let count: i32 = self
            .conn
            .query_row(&query, [table_name], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_execute() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let result = db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_attach_and_detach() {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabaseConn::open_in_memory().unwrap();

        db.attach(&dir.path().join("lab.sqlite3"), "lab").unwrap();
        db.execute("CREATE TABLE lab.subject (id INTEGER PRIMARY KEY)")
            .unwrap();
        assert!(db.table_exists("lab", "subject").unwrap());
        assert!(!db.table_exists("main", "subject").unwrap());

        db.detach("lab").unwrap();
        assert!(db.table_exists("lab", "subject").is_err());

        // the table lives in the file, not in the connection
        let reopened = DatabaseConn::open(Some(
            dir.path().join("lab.sqlite3").to_str().unwrap(),
        ))
        .unwrap();
        assert!(reopened.table_exists("main", "subject").unwrap());
    }

    #[test]
    fn test_detach_unknown_fails() {
        let db = DatabaseConn::open_in_memory().unwrap();
        assert!(db.detach("missing").is_err());
    }

    #[test]
    fn test_acquire_exclusive_busy_while_locked_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.sqlite3");

        let db = DatabaseConn::open_in_memory().unwrap();
        db.set_busy_timeout(Duration::from_millis(50)).unwrap();
        db.attach(&path, "lab").unwrap();
        db.execute("CREATE TABLE lab.subject (id INTEGER PRIMARY KEY)")
            .unwrap();
        db.acquire_exclusive().unwrap();

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let err = db.acquire_exclusive().unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy)
        );
        assert!(db.conn.is_autocommit());

        drop(other);
        db.acquire_exclusive().unwrap();
    }
}
