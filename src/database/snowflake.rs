/*!
 * Snowflake target through the Snowflake SQL API (v2).
 *
 * Statements are posted to `/api/v2/statements`. A 200 answer means the
 * statement finished, 202 means it is still running and must be polled,
 * 422 means Snowflake rejected the statement.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

use crate::app_config::{SnowflakeConfig, SnowflakeTokenType, MAX_STATEMENT_TIMEOUT_SECS};
use crate::errors::DatabaseError;
use super::{StatementHandle, TargetDatabase};

/// Body of a statement submission
#[derive(Debug, Serialize)]
pub struct StatementRequest<'a> {
    /// SQL text
    statement: &'a str,
    /// Server-side timeout in seconds
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    /// Session parameters for this statement
    parameters: StatementParameters,
}

/// Session parameters sent with each statement
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatementParameters {
    /// "0" accepts scripts holding any number of statements
    multi_statement_count: String,
}

/// Status fields shared by every SQL API answer
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    /// Snowflake status code
    #[serde(default)]
    pub code: Option<String>,
    /// SQLSTATE
    #[serde(default)]
    pub sql_state: Option<String>,
    /// Human readable status or error message
    #[serde(default)]
    pub message: Option<String>,
    /// Handle of the statement
    #[serde(default)]
    pub statement_handle: Option<String>,
}

/// Where a submitted statement stands
#[derive(Debug, Clone, PartialEq)]
pub enum StatementState {
    /// The statement completed
    Finished,
    /// The statement is still running and must be polled
    Running {
        /// Statement handle to poll or cancel
        handle: String,
    },
}

/// Interpret an SQL API answer
pub fn interpret_response(status: u16, body: &str) -> Result<StatementState, DatabaseError> {
    let parsed: StatementResponse = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        200 => Ok(StatementState::Finished),
        202 => parsed.statement_handle
            .map(|handle| StatementState::Running { handle })
            .ok_or_else(|| DatabaseError::Other("Statement accepted without a handle".to_string())),
        422 => Err(DatabaseError::Programming {
            message: match &parsed.code {
                Some(code) => format!("{}: {}", code, message),
                None => message,
            },
            sql_state: parsed.sql_state,
        }),
        401 | 403 => Err(DatabaseError::Connection(format!("Snowflake rejected the credentials: {}", message))),
        408 => Err(DatabaseError::Other(format!("Statement timed out: {}", message))),
        _ => Err(DatabaseError::Other(format!("Snowflake answered HTTP {}: {}", status, message))),
    }
}

/// Connection settings shared by the session and its statement handles
struct SnowflakeClient {
    http: Client,
    base_url: Url,
    token: String,
    token_type: SnowflakeTokenType,
    warehouse: String,
    database: String,
    schema: String,
    role: String,
    statement_timeout_secs: u64,
    poll_interval: Duration,
}

impl fmt::Debug for SnowflakeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .field("statement_timeout_secs", &self.statement_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() { None } else { Some(value) }
}

impl SnowflakeClient {
    fn endpoint(&self, path: &str) -> Result<Url, DatabaseError> {
        self.base_url.join(path)
            .map_err(|e| DatabaseError::Other(format!("Invalid Snowflake URL for {}: {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-Snowflake-Authorization-Token-Type", self.token_type.header_value())
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, concat!("sqlshift/", env!("CARGO_PKG_VERSION")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<(u16, String), DatabaseError> {
        let response = self.authorize(request)
            .send()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Snowflake request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.text().await
            .map_err(|e| DatabaseError::Connection(format!("Failed to read Snowflake response: {}", e)))?;
        Ok((status, body))
    }

    async fn submit(&self, sql: &str) -> Result<StatementState, DatabaseError> {
        let mut url = self.endpoint("/api/v2/statements")?;
        url.query_pairs_mut().append_pair("requestId", &Uuid::new_v4().to_string());

        let body = StatementRequest {
            statement: sql,
            timeout: self.statement_timeout_secs,
            database: non_empty(&self.database),
            schema: non_empty(&self.schema),
            warehouse: non_empty(&self.warehouse),
            role: non_empty(&self.role),
            parameters: StatementParameters {
                multi_statement_count: "0".to_string(),
            },
        };

        let (status, text) = self.send(self.http.post(url).json(&body)).await?;
        debug!("Snowflake submit answered HTTP {}", status);
        interpret_response(status, &text)
    }

    async fn poll(&self, handle: &str) -> Result<StatementState, DatabaseError> {
        let url = self.endpoint(&format!("/api/v2/statements/{}", handle))?;
        let (status, text) = self.send(self.http.get(url)).await?;
        interpret_response(status, &text)
    }

    async fn cancel(&self, handle: &str) -> Result<(), DatabaseError> {
        let url = self.endpoint(&format!("/api/v2/statements/{}/cancel", handle))?;
        let (status, text) = self.send(self.http.post(url)).await?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(DatabaseError::Other(format!("Failed to cancel statement {}: HTTP {} {}", handle, status, text.trim())))
        }
    }
}

/// Session with a Snowflake account
#[derive(Debug)]
pub struct SnowflakeDatabase {
    client: Arc<SnowflakeClient>,
}

impl SnowflakeDatabase {
    /// Open a session and verify it with a trivial query
    pub async fn connect(config: &SnowflakeConfig) -> Result<Self, DatabaseError> {
        let base_url = config.base_url()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        if config.statement_timeout_secs > MAX_STATEMENT_TIMEOUT_SECS {
            return Err(DatabaseError::Connection(format!(
                "Statement timeout of {}s exceeds the {}s limit",
                config.statement_timeout_secs, MAX_STATEMENT_TIMEOUT_SECS
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.statement_timeout_secs.saturating_add(30)))
            .build()
            .map_err(|e| DatabaseError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        let database = Self {
            client: Arc::new(SnowflakeClient {
                http,
                base_url,
                token: config.token.clone(),
                token_type: config.token_type.clone(),
                warehouse: config.warehouse.clone(),
                database: config.database.clone(),
                schema: config.schema.clone(),
                role: config.role.clone(),
                statement_timeout_secs: config.statement_timeout_secs,
                poll_interval: Duration::from_millis(config.poll_interval_ms.max(50)),
            }),
        };

        let mut probe = database.create_statement().await?;
        let probe_result = probe.execute("SELECT 1").await;
        if let Err(e) = probe.close().await {
            warn!("Failed to close probe statement: {}", e);
        }
        probe_result.map_err(|e| DatabaseError::Connection(format!("Failed to connect to Snowflake: {}", e)))?;

        info!("Connected to Snowflake at {}", database.client.base_url);
        Ok(database)
    }
}

#[async_trait]
impl TargetDatabase for SnowflakeDatabase {
    type Statement = SnowflakeStatement;

    fn describe(&self) -> String {
        format!(
            "Snowflake {} ({}.{})",
            self.client.base_url.host_str().unwrap_or("unknown"),
            self.client.database,
            self.client.schema
        )
    }

    async fn create_statement(&self) -> Result<Self::Statement, DatabaseError> {
        Ok(SnowflakeStatement {
            client: Arc::clone(&self.client),
            in_flight: None,
        })
    }

    async fn close(self) -> Result<(), DatabaseError> {
        // The SQL API keeps no server-side session for us to end
        debug!("Closed Snowflake session {}", self.describe());
        Ok(())
    }
}

/// Statement handle; remembers a statement still running so closing the
/// handle can cancel it
#[derive(Debug)]
pub struct SnowflakeStatement {
    client: Arc<SnowflakeClient>,
    in_flight: Option<String>,
}

#[async_trait]
impl StatementHandle for SnowflakeStatement {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let deadline = Instant::now().checked_add(Duration::from_secs(self.client.statement_timeout_secs));
        let mut state = self.client.submit(sql).await?;

        loop {
            match state {
                StatementState::Finished => {
                    self.in_flight = None;
                    return Ok(());
                }
                StatementState::Running { handle } => {
                    self.in_flight = Some(handle.clone());
                    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        return Err(DatabaseError::Other(format!("Statement {} did not finish in time", handle)));
                    }
                    tokio::time::sleep(self.client.poll_interval).await;
                    state = match self.client.poll(&handle).await {
                        Err(e @ DatabaseError::Connection(_)) => return Err(e),
                        Err(e) => {
                            self.in_flight = None;
                            return Err(e);
                        }
                        Ok(next) => next,
                    };
                }
            }
        }
    }

    async fn close(self) -> Result<(), DatabaseError> {
        if let Some(handle) = &self.in_flight {
            warn!("Cancelling unfinished statement {}", handle);
            self.client.cancel(handle).await?;
        }
        Ok(())
    }
}
