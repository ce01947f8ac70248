/*!
 * Target database sessions.
 *
 * This module provides the targets converted scripts are registered in:
 * - Snowflake through the SQL API
 * - SQLite, a local target for trying conversions out
 * - A scripted mock target for tests
 *
 * A session is opened once per batch and closed once at the end. Every
 * submission goes through its own statement handle, which the caller closes
 * before the next submission.
 */

use async_trait::async_trait;

use crate::errors::DatabaseError;

/// An open session with a target database
#[async_trait]
pub trait TargetDatabase: Send + Sync {
    /// Statement handle type of this target
    type Statement: StatementHandle;

    /// Short description of the target, for logs
    fn describe(&self) -> String;

    /// Create a statement handle for one submission
    async fn create_statement(&self) -> Result<Self::Statement, DatabaseError>;

    /// Close the session
    async fn close(self) -> Result<(), DatabaseError>;
}

/// A per-submission statement handle
#[async_trait]
pub trait StatementHandle: Send {
    /// Execute a SQL script
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Release the handle
    async fn close(self) -> Result<(), DatabaseError>;
}

pub mod snowflake;
pub mod sqlite;
pub mod mock;

// Re-export main types
pub use snowflake::SnowflakeDatabase;
pub use sqlite::SqliteDatabase;
