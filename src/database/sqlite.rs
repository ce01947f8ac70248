/*!
 * SQLite target.
 *
 * A local target for trying conversions without a warehouse. Each execution
 * runs in its own transaction, so a script that fails half way leaves
 * nothing behind. Blocking rusqlite calls run on tokio's blocking pool.
 */

use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::DatabaseError;
use super::{StatementHandle, TargetDatabase};

/// Path value selecting an in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Map a rusqlite error to the database error taxonomy
pub fn classify_error(error: rusqlite::Error) -> DatabaseError {
    // Statements that fail to prepare carry their code inside SqlInputError
    let code = match &error {
        rusqlite::Error::SqlInputError { error: ffi_error, .. } => Some(ffi_error.code),
        other => other.sqlite_error_code(),
    };

    match code {
        // SQLITE_ERROR covers syntax errors and unknown objects
        Some(ErrorCode::Unknown) | Some(ErrorCode::ConstraintViolation) => DatabaseError::programming(error.to_string()),
        Some(ErrorCode::CannotOpen) | Some(ErrorCode::NotADatabase) => DatabaseError::Connection(error.to_string()),
        _ => DatabaseError::Other(error.to_string()),
    }
}

/// Session with a SQLite database
#[derive(Clone)]
pub struct SqliteDatabase {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open the database at `path`, or an in-memory database for ":memory:"
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let db_path = path.as_ref().to_path_buf();
        if db_path.as_os_str() == IN_MEMORY {
            return Self::in_memory();
        }

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Connection(format!("Failed to create database directory {:?}: {}", parent, e)))?;
        }

        let open_path = db_path.clone();
        let conn = tokio::task::spawn_blocking(move || Connection::open(&open_path))
            .await
            .map_err(|e| DatabaseError::Connection(format!("Database task failed: {}", e)))?
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database {:?}: {}", db_path, e)))?;

        info!("Opened SQLite database at {:?}", db_path);
        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self, DatabaseError> {
        debug!("Creating in-memory database");

        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create in-memory database: {}", e)))?;

        Ok(Self {
            db_path: PathBuf::from(IN_MEMORY),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a read-only query returning one integer, for inspection
    pub fn query_i64(&self, sql: &str) -> Result<i64, DatabaseError> {
        let conn = self.connection
            .lock()
            .map_err(|e| DatabaseError::Other(format!("Failed to acquire database lock: {}", e)))?;
        conn.query_row(sql, [], |row| row.get(0)).map_err(classify_error)
    }
}

#[async_trait]
impl TargetDatabase for SqliteDatabase {
    type Statement = SqliteStatement;

    fn describe(&self) -> String {
        format!("SQLite {}", self.db_path.display())
    }

    async fn create_statement(&self) -> Result<Self::Statement, DatabaseError> {
        Ok(SqliteStatement {
            connection: Arc::clone(&self.connection),
        })
    }

    async fn close(self) -> Result<(), DatabaseError> {
        let description = self.describe();
        // Other handles would keep the connection alive; the last one closes it
        match Arc::try_unwrap(self.connection) {
            Ok(mutex) => {
                let conn = mutex.into_inner()
                    .map_err(|e| DatabaseError::Other(format!("Database lock poisoned: {}", e)))?;
                conn.close().map_err(|(_, e)| classify_error(e))?;
            }
            Err(_) => debug!("{} still referenced by open statement handles", description),
        }
        debug!("Closed {}", description);
        Ok(())
    }
}

/// Statement handle sharing the session's connection
pub struct SqliteStatement {
    connection: Arc<Mutex<Connection>>,
}

#[async_trait]
impl StatementHandle for SqliteStatement {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let connection = Arc::clone(&self.connection);
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = connection
                .lock()
                .map_err(|e| DatabaseError::Other(format!("Failed to acquire database lock: {}", e)))?;

            let tx = conn.transaction().map_err(classify_error)?;
            // Dropping the transaction on error rolls it back
            tx.execute_batch(&sql).map_err(classify_error)?;
            tx.commit().map_err(classify_error)
        })
        .await
        .map_err(|e| DatabaseError::Other(format!("Database task failed: {}", e)))?
    }

    async fn close(self) -> Result<(), DatabaseError> {
        // Nothing to release, the handle only shares the session's connection
        Ok(())
    }
}
