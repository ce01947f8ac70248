/*!
 * Conversion batches: from source scripts to created procedures.
 *
 * - `model`: Scripts, outcomes and the batch report
 * - `registrar`: Registration with a single repair cycle
 * - `orchestrator`: Sequential processing of a batch over one session
 * - `archive`: Zip packaging of the converted scripts
 */

pub use self::archive::build_archive;
pub use self::model::{
    BatchReport, ConvertedScript, Registration, RegistrationOutcome, Script, ScriptReport, Stage,
};
pub use self::orchestrator::BatchOrchestrator;
pub use self::registrar::register;

pub mod archive;
pub mod model;
pub mod orchestrator;
pub mod registrar;
