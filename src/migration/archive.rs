/*!
 * Zip packaging of converted scripts.
 */

use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::model::ConvertedScript;

/// Package converted scripts into an in-memory zip archive
///
/// One entry per script, named by the script name, holding the converted body.
pub fn build_archive(scripts: &[ConvertedScript]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for script in scripts {
        zip.start_file(script.name.as_str(), options)
            .with_context(|| format!("Failed to add {} to archive", script.name))?;
        zip.write_all(script.body.as_bytes())
            .with_context(|| format!("Failed to write {} to archive", script.name))?;
    }

    let cursor = zip.finish().context("Failed to finalize archive")?;
    Ok(cursor.into_inner())
}
