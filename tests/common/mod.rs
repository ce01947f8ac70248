/*!
 * Common test utilities for the sqlshift test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use tempfile::TempDir;

use sqlshift::app_config::GenerationConfig;
use sqlshift::conversion::ConversionService;
use sqlshift::dialects::SqlDialect;
use sqlshift::migration::BatchOrchestrator;
use sqlshift::providers::mock::MockProvider;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a small SQL Server procedure script
pub fn create_test_procedure(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"CREATE PROCEDURE dbo.LoadOrders
AS
BEGIN
    SET NOCOUNT ON;
    INSERT INTO dbo.Orders (Id, Total) SELECT Id, Total FROM dbo.StagingOrders;
END
"#;
    create_test_file(dir, filename, content)
}

/// Conversion service over a mock provider, SQL Server to Snowflake
pub fn converter(provider: &MockProvider) -> ConversionService {
    ConversionService::new(
        Arc::new(provider.clone()),
        GenerationConfig::default(),
        SqlDialect::SqlServer,
        SqlDialect::Snowflake,
    )
}

/// Batch orchestrator over a mock provider
pub fn orchestrator(provider: &MockProvider) -> BatchOrchestrator {
    BatchOrchestrator::new(converter(provider))
}
