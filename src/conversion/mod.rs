/*!
 * Script conversion using AI model providers.
 *
 * This module is split into several submodules:
 *
 * - `core`: The conversion service (convert and repair requests)
 * - `prompts`: Prompt construction for both requests
 * - `extract`: Extraction of the ```sql block from a model answer
 */

// Re-export main types for easier usage
pub use self::core::ConversionService;
pub use self::extract::extract_sql_block;
pub use self::prompts::PromptBuilder;

// Submodules
pub mod core;
pub mod extract;
pub mod prompts;
