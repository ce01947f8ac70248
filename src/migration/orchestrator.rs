/*!
 * Batch orchestration.
 *
 * Scripts are handled one at a time, in input order, over a single target
 * session: convert, archive the converted body, register. A per-script
 * failure never stops the batch; a failure of the session itself does.
 */

use log::{error, info, warn};
use std::future::Future;
use std::time::Instant;

use crate::conversion::ConversionService;
use crate::database::TargetDatabase;
use crate::errors::DatabaseError;
use super::model::{BatchReport, ConvertedScript, Registration, Script, ScriptReport};
use super::registrar::register;

/// Drives a batch of scripts through conversion and registration
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    converter: ConversionService,
}

impl BatchOrchestrator {
    /// Create a new orchestrator
    pub fn new(converter: ConversionService) -> Self {
        Self { converter }
    }

    /// Process a batch
    pub async fn run<F, D>(&self, connect: F, scripts: &[Script]) -> BatchReport
    where
        F: Future<Output = Result<D, DatabaseError>>,
        D: TargetDatabase,
    {
        self.run_with_progress(connect, scripts, |_, _, _| {}).await
    }

    /// Process a batch, reporting `(completed, total, script)` after each script
    ///
    /// The session is opened by awaiting `connect` once and closed once at the
    /// end. When it cannot be opened, nothing is converted.
    pub async fn run_with_progress<F, D, P>(&self, connect: F, scripts: &[Script], mut progress: P) -> BatchReport
    where
        F: Future<Output = Result<D, DatabaseError>>,
        D: TargetDatabase,
        P: FnMut(usize, usize, &ScriptReport),
    {
        let total = scripts.len();
        let mut report = BatchReport::default();

        let db = match connect.await {
            Ok(db) => db,
            Err(e) => {
                let reason = format!("Cannot connect to target database: {}", e);
                error!("{}", reason);
                for (index, script) in scripts.iter().enumerate() {
                    let skipped = ScriptReport::skipped(&script.name, &reason);
                    progress(index + 1, total, &skipped);
                    report.record(skipped);
                }
                report.aborted = Some(reason);
                return report;
            }
        };

        info!("Processing {} script(s) against {}", total, db.describe());
        let start_time = Instant::now();

        for (index, script) in scripts.iter().enumerate() {
            if let Some(reason) = &report.aborted {
                let skipped = ScriptReport::skipped(&script.name, reason);
                progress(index + 1, total, &skipped);
                report.record(skipped);
                continue;
            }

            let script_report = self.process_script(&db, script, &mut report).await;
            progress(index + 1, total, &script_report);
            report.record(script_report);
        }

        if let Err(e) = db.close().await {
            warn!("Failed to close target database session: {}", e);
        }

        info!(
            "Batch finished in {:?}: {} created, {} not created",
            start_time.elapsed(),
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }

    /// Convert and register one script; sets `report.aborted` on a fatal error
    async fn process_script<D: TargetDatabase>(&self, db: &D, script: &Script, report: &mut BatchReport) -> ScriptReport {
        let converted = match self.converter.convert(&script.body).await {
            Ok(converted) => converted,
            Err(e) => {
                warn!("{}: conversion failed: {}", script.name, e);
                return ScriptReport::conversion_failed(&script.name, e.to_string());
            }
        };

        report.converted.push(ConvertedScript {
            name: script.name.clone(),
            body: converted.clone(),
        });

        match register(db, &self.converter, &converted).await {
            Ok(registration) => {
                info!("{}: {:?}", script.name, registration.outcome);
                ScriptReport::registered(&script.name, registration)
            }
            Err(e) => {
                let reason = format!("Target database failure on {}: {}", script.name, e);
                error!("{}", reason);
                report.aborted = Some(reason);
                ScriptReport::registered(&script.name, Registration::failed(false, e.to_string()))
            }
        }
    }
}
