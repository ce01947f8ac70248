/*!
 * Extraction of the SQL code block from a model answer.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening marker of a SQL fenced block
pub const SQL_FENCE_OPEN: &str = "```sql";

/// Closing marker of a fenced block
pub const FENCE_CLOSE: &str = "```";

// Lazy match from the first opening marker to the nearest closing marker.
static SQL_BLOCK: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!("(?s){}(.*?){}", regex::escape(SQL_FENCE_OPEN), regex::escape(FENCE_CLOSE));
    Regex::new(&pattern).expect("SQL block pattern is valid")
});

/// Return the trimmed text between the first "```sql" marker and the next
/// "```" after it.
///
/// Returns `None` when the text has no opening marker, or when the opening
/// marker is never closed. The extracted text is not checked for validity.
pub fn extract_sql_block(text: &str) -> Option<String> {
    SQL_BLOCK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().trim().to_string())
}
