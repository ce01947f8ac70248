/*!
 * # sqlshift - SQL dialect conversion with AI
 *
 * A Rust library for converting stored procedure scripts between SQL
 * dialects with an AI model, and creating the result in a target database.
 *
 * ## Features
 *
 * - Conversion through various AI providers:
 *   - Anthropic Messages API
 *   - Ollama (local LLM)
 * - One automatic repair cycle when the target database rejects a script
 * - Target databases:
 *   - Snowflake through its SQL API
 *   - SQLite, for trying conversions locally
 * - Zip archive of every converted script
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `conversion`: Prompting the model and extracting the SQL it returns
 * - `providers`: Client implementations for the model providers
 * - `database`: Target database sessions and statement handles
 * - `migration`: Batch orchestration, registration and archiving
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `dialects`: SQL dialect identifiers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod conversion;
pub mod database;
pub mod dialects;
pub mod errors;
pub mod file_utils;
pub mod migration;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use conversion::{ConversionService, extract_sql_block};
pub use dialects::SqlDialect;
pub use errors::{ConversionError, DatabaseError, ProviderError};
pub use migration::{BatchOrchestrator, BatchReport, RegistrationOutcome, Script};
