/*!
 * Registration of converted scripts in the target database.
 *
 * A rejected script gets one repair cycle: the database's message goes back
 * to the model, and the corrected script is submitted once more.
 */

use log::{debug, info, warn};

use crate::conversion::ConversionService;
use crate::database::{StatementHandle, TargetDatabase};
use crate::errors::DatabaseError;
use super::model::Registration;

/// Register a converted script, repairing it once if the database rejects it
///
/// # Returns
/// * `Ok(Registration)` - Whether the procedure was created
/// * `Err(DatabaseError)` - A failure outside the programming category,
///   which ends the batch
pub async fn register<D: TargetDatabase>(
    db: &D,
    converter: &ConversionService,
    sql: &str,
) -> Result<Registration, DatabaseError> {
    let first_error = match submit(db, sql).await {
        Ok(()) => return Ok(Registration::succeeded(false)),
        Err(DatabaseError::Programming { message, .. }) => message,
        Err(e) => return Err(e),
    };

    info!("Script rejected by {}, asking for a repair: {}", db.describe(), first_error);

    let repaired_sql = match converter.repair(sql, &first_error).await {
        Ok(repaired_sql) => repaired_sql,
        Err(e) => {
            warn!("No repaired script: {}", e);
            return Ok(Registration::failed(false, first_error));
        }
    };

    match submit(db, &repaired_sql).await {
        Ok(()) => Ok(Registration::succeeded(true)),
        Err(DatabaseError::Programming { message, .. }) => {
            debug!("Repaired script rejected as well: {}", message);
            Ok(Registration::failed(true, message))
        }
        Err(e) => Err(e),
    }
}

/// Execute a script through a fresh statement handle, closing it on every path
async fn submit<D: TargetDatabase>(db: &D, sql: &str) -> Result<(), DatabaseError> {
    let mut statement = db.create_statement().await?;
    let result = statement.execute(sql).await;

    if let Err(e) = statement.close().await {
        warn!("Failed to close statement handle: {}", e);
    }

    result
}
