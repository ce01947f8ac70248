/*!
 * Mock target database for testing.
 *
 * Records every submission and counts statement handles and session closes,
 * so tests can check the registration protocol without a real database.
 * Results are taken, in order, from:
 * - the scripted queue
 * - the first rule whose needle occurs in the SQL
 * - the default result (success unless `always_failing`)
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::errors::DatabaseError;
use super::{StatementHandle, TargetDatabase};

#[derive(Debug, Default)]
struct MockDatabaseState {
    scripted: VecDeque<Result<(), DatabaseError>>,
    rules: Vec<(String, DatabaseError)>,
    default_error: Option<DatabaseError>,
    create_statement_error: Option<DatabaseError>,
    executed: Vec<String>,
    statements_created: usize,
    statements_closed: usize,
    session_closes: usize,
}

/// Scripted in-memory target
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockDatabaseState>>,
}

impl MockDatabase {
    /// A target that accepts every script
    pub fn new() -> Self {
        Self::default()
    }

    /// A target that rejects every script with `error`
    pub fn always_failing(error: DatabaseError) -> Self {
        let db = Self::new();
        db.lock().default_error = Some(error);
        db
    }

    /// A target that replays `results` for the first submissions
    pub fn scripted(results: Vec<Result<(), DatabaseError>>) -> Self {
        let db = Self::new();
        db.lock().scripted = results.into();
        db
    }

    /// Reject any script containing `needle` with `error`
    pub fn fail_when_contains(self, needle: impl Into<String>, error: DatabaseError) -> Self {
        self.lock().rules.push((needle.into(), error));
        self
    }

    /// Fail every attempt to create a statement handle
    pub fn fail_create_statement(self, error: DatabaseError) -> Self {
        self.lock().create_statement_error = Some(error);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockDatabaseState> {
        self.state.lock().expect("mock database state poisoned")
    }

    /// Scripts submitted so far, in order
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    /// Number of statement handles created
    pub fn statements_created(&self) -> usize {
        self.lock().statements_created
    }

    /// Number of statement handles closed
    pub fn statements_closed(&self) -> usize {
        self.lock().statements_closed
    }

    /// Number of times the session was closed
    pub fn session_closes(&self) -> usize {
        self.lock().session_closes
    }
}

#[async_trait]
impl TargetDatabase for MockDatabase {
    type Statement = MockStatement;

    fn describe(&self) -> String {
        "mock database".to_string()
    }

    async fn create_statement(&self) -> Result<Self::Statement, DatabaseError> {
        let mut state = self.lock();
        if let Some(error) = &state.create_statement_error {
            return Err(error.clone());
        }
        state.statements_created += 1;
        Ok(MockStatement {
            state: Arc::clone(&self.state),
        })
    }

    async fn close(self) -> Result<(), DatabaseError> {
        self.lock().session_closes += 1;
        Ok(())
    }
}

/// Statement handle of the mock target
#[derive(Debug)]
pub struct MockStatement {
    state: Arc<Mutex<MockDatabaseState>>,
}

#[async_trait]
impl StatementHandle for MockStatement {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().expect("mock database state poisoned");
        state.executed.push(sql.to_string());

        if let Some(result) = state.scripted.pop_front() {
            return result;
        }
        if let Some((_, error)) = state.rules.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            return Err(error.clone());
        }
        match &state.default_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn close(self) -> Result<(), DatabaseError> {
        self.state.lock().expect("mock database state poisoned").statements_closed += 1;
        Ok(())
    }
}
