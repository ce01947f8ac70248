/*!
 * Error types for the sqlshift application.
 *
 * This module contains custom error types for the different parts of the
 * conversion workflow, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with model provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while asking a model to convert or repair a script
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The script body was empty, nothing was sent to the model
    #[error("Script is empty")]
    EmptyScript,

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model answered but the answer held no fenced SQL block
    #[error("Response from '{model}' contained no ```sql block")]
    MissingCodeBlock {
        /// Model that produced the response
        model: String,
    },

    /// The fenced SQL block in the answer was empty
    #[error("Response from '{model}' held an empty ```sql block")]
    EmptyCodeBlock {
        /// Model that produced the response
        model: String,
    },
}

/// Errors reported by a target database
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatabaseError {
    /// The database rejected the statement itself (syntax, compilation,
    /// unknown object...). Only this category triggers a repair cycle.
    #[error("SQL error: {message}")]
    Programming {
        /// Human-readable message from the database
        message: String,
        /// SQLSTATE code when the database reports one
        sql_state: Option<String>,
    },

    /// The session could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other failure
    #[error("Database error: {0}")]
    Other(String),
}

impl DatabaseError {
    /// Build a programming error without a SQLSTATE
    pub fn programming(message: impl Into<String>) -> Self {
        Self::Programming {
            message: message.into(),
            sql_state: None,
        }
    }
}
