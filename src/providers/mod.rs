/*!
 * Provider implementations for the model services that convert scripts.
 *
 * This module contains client implementations for the supported LLM providers:
 * - Anthropic: Anthropic Messages API
 * - Ollama: Local LLM server
 * - Mock: Scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{ModelConfig, ModelProvider, GenerationConfig};
use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// Every call is a single user turn carrying the whole prompt; the provider
/// returns the text of the model's answer.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Model identifier, used in diagnostics
    fn model(&self) -> &str;

    /// Complete a single-turn prompt
    ///
    /// # Arguments
    /// * `prompt` - The full user turn
    /// * `generation` - Fixed generation parameters
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The answer text or an error
    async fn complete(&self, prompt: &str, generation: &GenerationConfig) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Build the configured provider
pub fn from_config(config: &ModelConfig) -> Arc<dyn Provider> {
    let timeout = Duration::from_secs(config.get_timeout_secs());
    match config.provider {
        ModelProvider::Anthropic => Arc::new(anthropic::Anthropic::with_timeout(
            config.get_api_key(),
            config.get_endpoint(),
            config.get_model(),
            timeout,
        )),
        ModelProvider::Ollama => Arc::new(ollama::Ollama::with_timeout(
            config.get_endpoint(),
            config.get_model(),
            timeout,
        )),
    }
}

pub mod anthropic;
pub mod ollama;
pub mod mock;
