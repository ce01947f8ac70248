/*!
 * Prompt construction for script conversion and repair.
 *
 * Both prompts are a single human turn closed by an "Assistant:" line, so the
 * "\n\nHuman:" stop sequence ends generation if the model starts a new turn.
 */

use crate::dialects::SqlDialect;

/// Builder for the conversion and repair prompts of one dialect pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptBuilder {
    source: SqlDialect,
    target: SqlDialect,
}

impl PromptBuilder {
    /// Create a new prompt builder.
    pub fn new(source: SqlDialect, target: SqlDialect) -> Self {
        Self { source, target }
    }

    /// Sentence steering the model away from non-SQL procedure languages.
    fn pure_sql_instruction(&self) -> String {
        let target = self.target.display_name();
        match self.target.embedded_procedure_language() {
            Some(language) => format!(
                "Use SQL language for the procedure. Don't use {}. Write high-quality {} SQL code for the conversion.",
                language, target
            ),
            None => format!(
                "Use SQL language for the procedure. Don't use any embedded non-SQL language. Write high-quality {} SQL code for the conversion.",
                target
            ),
        }
    }

    /// Prompt asking the model to convert `source_sql` to the target dialect.
    pub fn conversion(&self, source_sql: &str) -> String {
        let source = self.source.display_name();
        let target = self.target.display_name();

        format!(
            "Human: You are a highly skilled SQL and {target} expert. \
Your task is to convert a {source} stored procedure into a {target}-compatible stored procedure. \
{instruction}\n\n\
Ensure the conversion handles all necessary syntax differences between {source} and {target}. \
Review your output thoroughly to confirm there are no syntax errors or functional discrepancies. \
Return the complete converted procedure in a single ```sql code block.\n\n\
Here is the {source} stored procedure code:\n\
<task>\n{source_sql}\n</task>\n\n\
Assistant:",
            target = target,
            source = source,
            instruction = self.pure_sql_instruction(),
            source_sql = source_sql,
        )
    }

    /// Prompt asking the model to fix `converted_sql` given the database's
    /// `error_message`.
    pub fn repair(&self, converted_sql: &str, error_message: &str) -> String {
        let target = self.target.display_name();

        format!(
            "Human: You are a highly skilled SQL and {target} expert. \
Your task is to resolve an issue with a {target} stored procedure.\n\
You will be provided with a {target} stored procedure and the error {target} reported when creating it. \
Resolve the code issue based on the error message.\n\n\
Review your output thoroughly to confirm there are no syntax errors or functional discrepancies. \
Return the complete corrected procedure in a single ```sql code block.\n\n\
Here is the {target} stored procedure code:\n\
<task>\n{converted_sql}\n</task>\n\
<error>\n{error_message}\n</error>\n\n\
Assistant:",
            target = target,
            converted_sql = converted_sql,
            error_message = error_message,
        )
    }
}
