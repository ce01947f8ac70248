/*!
 * Data model of a conversion batch.
 */

use anyhow::Result;
use std::fmt;

use super::archive::build_archive;

/// A source-dialect script read from an input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Base name of the input file, e.g. `load_orders.sql`
    pub name: String,

    /// Source-dialect SQL
    pub body: String,
}

impl Script {
    /// Create a new script
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// A script converted to the target dialect, as it goes into the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedScript {
    /// Name of the source script
    pub name: String,

    /// Converted body, before any repair
    pub body: String,
}

/// Final outcome of registering one script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Succeeded,
    Failed,
}

/// Detailed result of one registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Whether the procedure was created
    pub outcome: RegistrationOutcome,

    /// Whether a repaired script was submitted
    pub repaired: bool,

    /// Last database or repair error, if any
    pub error: Option<String>,
}

impl Registration {
    pub fn succeeded(repaired: bool) -> Self {
        Self {
            outcome: RegistrationOutcome::Succeeded,
            repaired,
            error: None,
        }
    }

    pub fn failed(repaired: bool, error: impl Into<String>) -> Self {
        Self {
            outcome: RegistrationOutcome::Failed,
            repaired,
            error: Some(error.into()),
        }
    }
}

/// Step at which a script's processing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The model did not return a converted script
    Conversion,
    /// The converted script was submitted to the target
    Registration,
    /// Not attempted because the batch was aborted
    Skipped,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion => write!(f, "conversion"),
            Self::Registration => write!(f, "registration"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-script line of the run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub name: String,
    pub outcome: RegistrationOutcome,
    pub stage: Stage,
    pub repaired: bool,
    pub error: Option<String>,
}

impl ScriptReport {
    /// Script whose conversion returned nothing usable
    pub fn conversion_failed(name: &str, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            outcome: RegistrationOutcome::Failed,
            stage: Stage::Conversion,
            repaired: false,
            error: Some(error.into()),
        }
    }

    /// Script that went through registration
    pub fn registered(name: &str, registration: Registration) -> Self {
        Self {
            name: name.to_string(),
            outcome: registration.outcome,
            stage: Stage::Registration,
            repaired: registration.repaired,
            error: registration.error,
        }
    }

    /// Script left untouched after the batch was aborted
    pub fn skipped(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: RegistrationOutcome::Failed,
            stage: Stage::Skipped,
            repaired: false,
            error: Some(reason.to_string()),
        }
    }

    /// One line of the plain-text run log
    pub fn log_line(&self) -> String {
        let status = match self.outcome {
            RegistrationOutcome::Succeeded => "CREATED",
            RegistrationOutcome::Failed => "NOT CREATED",
        };
        let mut line = format!("{} [{}] stage={}", self.name, status, self.stage);
        if self.repaired {
            line.push_str(" repaired=yes");
        }
        if let Some(error) = &self.error {
            line.push_str(&format!(" error={}", error.replace('\n', " ")));
        }
        line
    }
}

/// Result of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Names of scripts whose procedure was created
    pub succeeded: Vec<String>,

    /// Names of scripts whose procedure was not created
    pub failed: Vec<String>,

    /// Archive entries, one per converted script
    pub converted: Vec<ConvertedScript>,

    /// Per-script details, in input order
    pub scripts: Vec<ScriptReport>,

    /// Reason the batch stopped early, if it did
    pub aborted: Option<String>,
}

impl BatchReport {
    /// Record a script's final state in the matching outcome list
    pub fn record(&mut self, report: ScriptReport) {
        match report.outcome {
            RegistrationOutcome::Succeeded => self.succeeded.push(report.name.clone()),
            RegistrationOutcome::Failed => self.failed.push(report.name.clone()),
        }
        self.scripts.push(report);
    }

    /// Whether the batch stopped before attempting every script
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Number of scripts in the batch
    pub fn total(&self) -> usize {
        self.scripts.len()
    }

    /// Zip archive of the converted scripts, `None` when nothing converted
    pub fn archive(&self) -> Result<Option<Vec<u8>>> {
        if self.converted.is_empty() {
            return Ok(None);
        }
        build_archive(&self.converted).map(Some)
    }

    /// Plain-text run log
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Scripts: {} | created: {} | not created: {} | converted: {}\n",
            self.total(),
            self.succeeded.len(),
            self.failed.len(),
            self.converted.len()
        ));
        if let Some(reason) = &self.aborted {
            out.push_str(&format!("Batch aborted: {}\n", reason));
        }
        out.push('\n');
        for script in &self.scripts {
            out.push_str(&script.log_line());
            out.push('\n');
        }
        out
    }
}
