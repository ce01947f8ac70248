use anyhow::{Result, Context, anyhow};
use log::{info, warn};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::{Config, TargetKind};
use crate::conversion::ConversionService;
use crate::database::{SnowflakeDatabase, SqliteDatabase, TargetDatabase};
use crate::file_utils::FileManager;
use crate::migration::{BatchOrchestrator, BatchReport, Script, ScriptReport};

// @module: Application controller for conversion batches

/// Files written at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutputs {
    /// Archive of converted scripts, absent when nothing converted
    pub archive_path: Option<PathBuf>,

    /// Plain-text run report, absent when disabled
    pub report_path: Option<PathBuf>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Conversion service built from the model config
    converter: ConversionService,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let converter = ConversionService::from_config(&config);
        Ok(Self { config, converter })
    }

    /// Create a controller around an existing conversion service
    pub fn with_converter(config: Config, converter: ConversionService) -> Self {
        Self { config, converter }
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole workflow: load scripts, process them, write outputs
    pub async fn run(&self, inputs: &[PathBuf], output_dir: &Path) -> Result<(BatchReport, RunOutputs)> {
        let start_time = Instant::now();

        let scripts = FileManager::load_scripts(inputs)?;
        if scripts.is_empty() {
            return Err(anyhow!("No .sql files found in {:?}", inputs));
        }

        info!(
            "sqlshift: {} -> {} with {} - {}",
            self.config.source_dialect.display_name(),
            self.config.target_dialect.display_name(),
            self.config.model.provider.display_name(),
            self.converter.model()
        );

        let report = self.process(&scripts).await;
        let outputs = self.write_outputs(&report, output_dir)?;

        self.print_summary(&report, &outputs);
        info!("Done in {}.", Self::format_duration(start_time.elapsed()));

        Ok((report, outputs))
    }

    /// Process loaded scripts against the configured target
    pub async fn process(&self, scripts: &[Script]) -> BatchReport {
        let orchestrator = BatchOrchestrator::new(self.converter.clone());
        let progress_bar = Self::progress_bar(scripts.len());

        let on_progress = |completed: usize, _total: usize, script: &ScriptReport| {
            progress_bar.set_position(completed as u64);
            progress_bar.set_message(script.name.clone());
        };

        let report = match self.config.target.kind {
            TargetKind::Snowflake => {
                let connect = SnowflakeDatabase::connect(&self.config.target.snowflake);
                orchestrator.run_with_progress(connect, scripts, on_progress).await
            }
            TargetKind::Sqlite => {
                let connect = SqliteDatabase::connect(&self.config.target.sqlite.path);
                orchestrator.run_with_progress(connect, scripts, on_progress).await
            }
        };

        progress_bar.finish_and_clear();
        report
    }

    /// Test the model provider and open then close the target database
    pub async fn check(&self) -> Result<()> {
        self.converter.test_connection().await
            .with_context(|| format!("Model '{}' is not reachable", self.converter.model()))?;
        info!("Model '{}' is reachable", self.converter.model());

        match self.config.target.kind {
            TargetKind::Snowflake => {
                let db = SnowflakeDatabase::connect(&self.config.target.snowflake).await?;
                Self::close_checked(db).await?;
            }
            TargetKind::Sqlite => {
                let db = SqliteDatabase::connect(&self.config.target.sqlite.path).await?;
                Self::close_checked(db).await?;
            }
        }

        Ok(())
    }

    async fn close_checked<D: TargetDatabase>(db: D) -> Result<()> {
        let description = db.describe();
        db.close().await?;
        info!("{} is reachable", description);
        Ok(())
    }

    /// Write the archive and the run report into `output_dir`
    pub fn write_outputs(&self, report: &BatchReport, output_dir: &Path) -> Result<RunOutputs> {
        FileManager::ensure_dir(output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

        let mut outputs = RunOutputs::default();

        match report.archive()? {
            Some(bytes) => {
                let path = output_dir.join(&self.config.output.archive_name);
                FileManager::write_bytes(&path, &bytes)?;
                outputs.archive_path = Some(path);
            }
            None => warn!("No script was converted, no archive written"),
        }

        if self.config.output.write_report {
            let path = output_dir.join(&self.config.output.report_name);
            self.write_report_to_file(report, &path)?;
            outputs.report_path = Some(path);
        }

        Ok(outputs)
    }

    fn write_report_to_file(&self, report: &BatchReport, path: &Path) -> Result<()> {
        let mut content = String::new();
        content.push_str(&format!("Conversion Log - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        content.push_str(&format!(
            "Context: {} -> {}, model {}\n",
            self.config.source_dialect.display_name(),
            self.config.target_dialect.display_name(),
            self.converter.model()
        ));
        content.push_str(&report.render_log());

        FileManager::write_to_file(path, &content)
    }

    fn print_summary(&self, report: &BatchReport, outputs: &RunOutputs) {
        println!("Successfully created procedures:");
        for name in &report.succeeded {
            println!("  {}", name);
        }
        println!("Not created procedures:");
        for name in &report.failed {
            println!("  {}", name);
        }
        if let Some(path) = &outputs.archive_path {
            println!("Converted scripts: {}", path.display());
        }
        if let Some(reason) = &report.aborted {
            warn!("Batch aborted: {}", reason);
        }
    }

    fn progress_bar(total: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scripts ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
