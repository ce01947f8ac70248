/*!
 * End-to-end batch tests: mock model, mock target database
 */

use std::collections::HashSet;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use sqlshift::database::mock::MockDatabase;
use sqlshift::errors::{DatabaseError, ProviderError};
use sqlshift::migration::{BatchReport, Script, Stage};
use sqlshift::providers::mock::MockProvider;
use crate::common;

/// Read every entry of the report's archive as (name, body)
fn archive_entries(report: &BatchReport) -> Vec<(String, String)> {
    let bytes = report.archive().unwrap().expect("archive expected");
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).unwrap();
        entries.push((file.name().to_string(), body));
    }
    entries
}

/// Every input lands in exactly one outcome list
fn assert_partition(report: &BatchReport, scripts: &[Script]) {
    let succeeded: HashSet<&String> = report.succeeded.iter().collect();
    let failed: HashSet<&String> = report.failed.iter().collect();
    assert!(succeeded.is_disjoint(&failed));
    assert_eq!(succeeded.len() + failed.len(), scripts.len());
    for script in scripts {
        assert!(succeeded.contains(&script.name) || failed.contains(&script.name));
    }
}

/// First script converts and registers, second gets no usable answer
#[tokio::test]
async fn test_batch_withSecondConversionAbsent_shouldArchiveOnlyFirst() {
    let provider = MockProvider::scripted(vec![
        Ok(MockProvider::fenced("CREATE PROCEDURE first() AS $$ SELECT 1 $$;")),
        Ok("I cannot convert this procedure.".to_string()),
    ]);
    let db = MockDatabase::new();
    let scripts = vec![
        Script::new("first.sql", "CREATE PROCEDURE dbo.first AS SELECT 1"),
        Script::new("second.sql", "CREATE PROCEDURE dbo.second AS SELECT 2"),
    ];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(db.clone()) }, &scripts).await;

    assert_eq!(report.succeeded, vec!["first.sql"]);
    assert_eq!(report.failed, vec!["second.sql"]);
    assert_eq!(report.scripts[1].stage, Stage::Conversion);
    assert_eq!(
        archive_entries(&report),
        vec![("first.sql".to_string(), "CREATE PROCEDURE first() AS $$ SELECT 1 $$;".to_string())]
    );
    assert_eq!(db.executed().len(), 1);
    assert_eq!(db.session_closes(), 1);
    assert_partition(&report, &scripts);
}

/// A repaired script succeeds, the archive keeps the body from before the repair
#[tokio::test]
async fn test_batch_withSuccessfulRepair_shouldArchivePreRepairBody() {
    let provider = MockProvider::scripted(vec![
        Ok(MockProvider::fenced("CREATE PROCEDURE p() ORIGINAL")),
        Ok(MockProvider::fenced("CREATE PROCEDURE p() REPAIRED")),
    ]);
    let db = MockDatabase::scripted(vec![Err(DatabaseError::programming("syntax error line 1"))]);
    let scripts = vec![Script::new("p.sql", "CREATE PROCEDURE dbo.p AS SELECT 1")];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(db.clone()) }, &scripts).await;

    assert_eq!(report.succeeded, vec!["p.sql"]);
    assert!(report.failed.is_empty());
    assert!(report.scripts[0].repaired);
    assert_eq!(db.executed(), vec!["CREATE PROCEDURE p() ORIGINAL", "CREATE PROCEDURE p() REPAIRED"]);
    assert_eq!(
        archive_entries(&report),
        vec![("p.sql".to_string(), "CREATE PROCEDURE p() ORIGINAL".to_string())]
    );
}

/// Per-script failures of every kind never stop the batch
#[tokio::test]
async fn test_batch_withMixedFailures_shouldAttemptEveryScript() {
    let provider = MockProvider::scripted(vec![
        Ok(MockProvider::fenced("CREATE PROCEDURE ok()")),
        Err(ProviderError::ConnectionError("model endpoint down".into())),
        Ok(MockProvider::fenced("CREATE PROCEDURE BROKEN()")),
        Ok("no block in the repair answer".to_string()),
        Ok(MockProvider::fenced("CREATE PROCEDURE last()")),
    ]);
    let db = MockDatabase::new().fail_when_contains("BROKEN", DatabaseError::programming("invalid"));
    let scripts = vec![
        Script::new("ok.sql", "SELECT 1"),
        Script::new("model_down.sql", "SELECT 2"),
        Script::new("broken.sql", "SELECT 3"),
        Script::new("last.sql", "SELECT 4"),
    ];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(db.clone()) }, &scripts).await;

    assert_eq!(report.succeeded, vec!["ok.sql", "last.sql"]);
    assert_eq!(report.failed, vec!["model_down.sql", "broken.sql"]);
    assert_eq!(report.converted.len(), 3);
    assert!(!report.is_aborted());
    assert_eq!(db.statements_created(), db.statements_closed());
    assert_partition(&report, &scripts);
}

/// Without a session nothing is converted and every script is skipped
#[tokio::test]
async fn test_batch_withConnectionFailure_shouldShortCircuit() {
    let provider = MockProvider::working();
    let scripts = vec![Script::new("a.sql", "SELECT 1"), Script::new("b.sql", "SELECT 2")];

    let report = common::orchestrator(&provider)
        .run(async { Err::<MockDatabase, _>(DatabaseError::Connection("authentication failed".into())) }, &scripts)
        .await;

    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed, vec!["a.sql", "b.sql"]);
    assert!(report.scripts.iter().all(|s| s.stage == Stage::Skipped));
    assert!(report.aborted.as_deref().unwrap_or_default().contains("authentication failed"));
    assert!(report.archive().unwrap().is_none());
    assert_eq!(provider.call_count(), 0);
}

/// A session failure mid-batch fails the current script and skips the rest
#[tokio::test]
async fn test_batch_withFatalErrorMidBatch_shouldSkipRemaining() {
    let provider = MockProvider::working();
    let db = MockDatabase::new().fail_when_contains("FATAL", DatabaseError::Other("warehouse suspended".into()));
    let scripts = vec![
        Script::new("a.sql", "SELECT 1"),
        Script::new("b.sql", "SELECT 'FATAL'"),
        Script::new("c.sql", "SELECT 3"),
    ];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(db.clone()) }, &scripts).await;

    assert_eq!(report.succeeded, vec!["a.sql"]);
    assert_eq!(report.failed, vec!["b.sql", "c.sql"]);
    assert_eq!(report.scripts[1].stage, Stage::Registration);
    assert_eq!(report.scripts[2].stage, Stage::Skipped);
    assert!(report.is_aborted());
    // c.sql was never sent to the model
    assert_eq!(provider.call_count(), 2);
    assert_eq!(db.session_closes(), 1);
    assert_partition(&report, &scripts);
}

/// An empty script is a conversion failure without a model call
#[tokio::test]
async fn test_batch_withEmptyScript_shouldFailWithoutModelCall() {
    let provider = MockProvider::working();
    let scripts = vec![Script::new("empty.sql", "   \n")];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(MockDatabase::new()) }, &scripts).await;

    assert_eq!(report.failed, vec!["empty.sql"]);
    assert_eq!(report.scripts[0].stage, Stage::Conversion);
    assert_eq!(provider.call_count(), 0);
}

/// An empty fenced answer counts as no conversion: not archived, not submitted
#[tokio::test]
async fn test_batch_withEmptyConvertedBlock_shouldNotRegister() {
    let provider = MockProvider::scripted(vec![Ok("```sql\n```".to_string())]);
    let db = MockDatabase::new();
    let scripts = vec![Script::new("p.sql", "CREATE PROCEDURE dbo.p AS SELECT 1")];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(db.clone()) }, &scripts).await;

    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed, vec!["p.sql"]);
    assert_eq!(report.scripts[0].stage, Stage::Conversion);
    assert!(report.converted.is_empty());
    assert!(report.archive().unwrap().is_none());
    assert!(db.executed().is_empty());
}

/// An empty fenced repair is no repair: the script fails after one submission
#[tokio::test]
async fn test_batch_withEmptyRepairBlock_shouldFailWithoutResubmitting() {
    let provider = MockProvider::scripted(vec![
        Ok(MockProvider::fenced("INSERT INTO t VALUES (NULL)")),
        Ok("```sql\n\n```".to_string()),
    ]);
    let db = MockDatabase::scripted(vec![Err(DatabaseError::programming("NOT NULL constraint failed: t.id"))]);
    let scripts = vec![Script::new("t.sql", "INSERT INTO dbo.t VALUES (NULL)")];

    let report = common::orchestrator(&provider).run(async { Ok::<_, DatabaseError>(db.clone()) }, &scripts).await;

    assert_eq!(report.failed, vec!["t.sql"]);
    assert_eq!(report.scripts[0].stage, Stage::Registration);
    assert!(!report.scripts[0].repaired);
    assert_eq!(db.executed(), vec!["INSERT INTO t VALUES (NULL)"]);
    assert_eq!(provider.call_count(), 2);
}
