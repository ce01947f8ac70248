/*!
 * Provider implementation tests
 */

pub mod ollama_test;
