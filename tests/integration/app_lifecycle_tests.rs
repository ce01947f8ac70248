/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::fs;
use std::io::Cursor;
use zip::ZipArchive;

use sqlshift::app_config::{Config, TargetKind};
use sqlshift::app_controller::Controller;
use sqlshift::providers::mock::MockProvider;
use crate::common;

/// Config targeting a SQLite file inside `dir`
fn sqlite_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.target.kind = TargetKind::Sqlite;
    config.target.sqlite.path = dir.join("target.db").to_string_lossy().to_string();
    config
}

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldUseConfiguredModel() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;

    assert_eq!(controller.config().model.get_model(), "claude-3-5-sonnet-20240620");
    Ok(())
}

/// Test a full run: scripts converted, created, archived and logged
#[tokio::test]
async fn test_run_withSqliteTarget_shouldWriteArchiveAndReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("procs");
    common::create_test_file(&input_dir, "customers.sql", "CREATE TABLE customers (id INTEGER);")?;
    common::create_test_file(&input_dir, "nested/orders.sql", "CREATE TABLE orders (id INTEGER);")?;
    let output_dir = temp_dir.path().join("out");

    let provider = MockProvider::working();
    let controller = Controller::with_converter(sqlite_config(temp_dir.path()), common::converter(&provider));

    let (report, outputs) = controller.run(&[input_dir], &output_dir).await?;

    assert_eq!(report.succeeded, vec!["customers.sql", "orders.sql"]);
    assert!(report.failed.is_empty());

    let archive_path = outputs.archive_path.expect("archive written");
    assert_eq!(archive_path, output_dir.join("converted_procedures.zip"));
    let archive = ZipArchive::new(Cursor::new(fs::read(&archive_path)?))?;
    assert_eq!(archive.len(), 2);

    let report_path = outputs.report_path.expect("report written");
    let log = fs::read_to_string(report_path)?;
    assert!(log.contains("customers.sql [CREATED] stage=registration"));
    assert!(log.contains("MS SQL Server -> Snowflake"));

    Ok(())
}

/// Test that nothing converted means no archive
#[tokio::test]
async fn test_run_withFailingModel_shouldSkipArchive() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let script = common::create_test_procedure(temp_dir.path(), "load_orders.sql")?;
    let output_dir = temp_dir.path().join("out");

    let provider = MockProvider::failing();
    let controller = Controller::with_converter(sqlite_config(temp_dir.path()), common::converter(&provider));

    let (report, outputs) = controller.run(&[script], &output_dir).await?;

    assert_eq!(report.failed, vec!["load_orders.sql"]);
    assert!(outputs.archive_path.is_none());
    assert!(!output_dir.join("converted_procedures.zip").exists());
    assert!(outputs.report_path.is_some());

    Ok(())
}

/// Test that an input without scripts is an error
#[tokio::test]
async fn test_run_withNoSqlFiles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", "nothing here")?;

    let controller = Controller::with_converter(
        sqlite_config(temp_dir.path()),
        common::converter(&MockProvider::working()),
    );

    let result = controller.run(&[temp_dir.path().to_path_buf()], temp_dir.path()).await;
    assert!(result.is_err());

    Ok(())
}

/// Test the connectivity check against both collaborators
#[tokio::test]
async fn test_check_withSqliteTarget_shouldReportModelOutage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let healthy = Controller::with_converter(
        sqlite_config(temp_dir.path()),
        common::converter(&MockProvider::working()),
    );
    healthy.check().await?;

    let outage = Controller::with_converter(
        sqlite_config(temp_dir.path()),
        common::converter(&MockProvider::failing()),
    );
    assert!(outage.check().await.is_err());

    Ok(())
}
