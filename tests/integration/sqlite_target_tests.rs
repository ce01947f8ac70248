/*!
 * Batches against a real SQLite target
 */

use anyhow::Result;
use sqlshift::database::SqliteDatabase;
use sqlshift::migration::{RegistrationOutcome, Script};
use sqlshift::providers::mock::MockProvider;
use crate::common;

fn count_objects(db: &SqliteDatabase, name: &str) -> Result<i64> {
    Ok(db.query_i64(&format!("SELECT COUNT(*) FROM sqlite_master WHERE name = '{}'", name))?)
}

/// A rejected script is repaired with the database's message and created
#[tokio::test]
async fn test_batch_withSqliteTarget_shouldCreateObjectsAndRepair() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("target.db");

    let provider = MockProvider::scripted(vec![
        Ok(MockProvider::fenced("CREATE TABLE orders (id INTEGER PRIMARY KEY, total REAL);")),
        Ok(MockProvider::fenced("CREAT VIEW v_orders AS SELECT id FROM orders;")),
        Ok(MockProvider::fenced("CREATE VIEW v_orders AS SELECT id FROM orders;")),
    ]);
    let scripts = vec![
        Script::new("orders.sql", "CREATE TABLE dbo.Orders (Id INT PRIMARY KEY, Total MONEY)"),
        Script::new("v_orders.sql", "CREATE VIEW dbo.vOrders AS SELECT Id FROM dbo.Orders"),
    ];

    let report = common::orchestrator(&provider)
        .run(SqliteDatabase::connect(&db_path), &scripts)
        .await;

    assert_eq!(report.succeeded, vec!["orders.sql", "v_orders.sql"]);
    assert!(!report.is_aborted());
    assert!(report.scripts[1].repaired);
    assert!(provider.prompts()[2].contains("<error>"));

    let db = SqliteDatabase::connect(&db_path).await?;
    assert_eq!(count_objects(&db, "orders")?, 1);
    assert_eq!(count_objects(&db, "v_orders")?, 1);

    Ok(())
}

/// A script failing half way leaves nothing behind
#[tokio::test]
async fn test_batch_withFailingScript_shouldRollBackPartialWork() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("target.db");
    let broken = "CREATE TABLE half (id INTEGER); CREAT VIEW x AS SELECT 1;";

    let provider = MockProvider::scripted(vec![
        Ok(MockProvider::fenced(broken)),
        Ok(MockProvider::fenced(broken)),
    ]);
    let scripts = vec![Script::new("half.sql", "SELECT 1")];

    let report = common::orchestrator(&provider)
        .run(SqliteDatabase::connect(&db_path), &scripts)
        .await;

    assert_eq!(report.failed, vec!["half.sql"]);
    assert!(!report.is_aborted());
    assert_eq!(report.scripts[0].outcome, RegistrationOutcome::Failed);
    assert!(report.scripts[0].repaired);

    let db = SqliteDatabase::connect(&db_path).await?;
    assert_eq!(count_objects(&db, "half")?, 0);

    Ok(())
}

/// An unopenable database path aborts the batch before any model call
#[tokio::test]
async fn test_batch_withUnopenableDatabase_shouldAbort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    // The parent of the database path is a regular file
    let blocker = common::create_test_file(temp_dir.path(), "blocker", "not a directory")?;
    let db_path = blocker.join("target.db");
    let provider = MockProvider::working();
    let scripts = vec![Script::new("a.sql", "SELECT 1")];

    let report = common::orchestrator(&provider)
        .run(SqliteDatabase::connect(&db_path), &scripts)
        .await;

    assert!(report.is_aborted());
    assert_eq!(report.failed, vec!["a.sql"]);
    assert_eq!(provider.call_count(), 0);

    Ok(())
}
