/*!
 * Core conversion service implementation.
 *
 * This module contains the ConversionService, which asks a model provider to
 * convert a script to the target dialect, or to repair a converted script
 * that the target database rejected.
 */

use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, GenerationConfig};
use crate::dialects::SqlDialect;
use crate::errors::{ConversionError, ProviderError};
use crate::providers::{self, Provider};
use super::extract::extract_sql_block;
use super::prompts::PromptBuilder;

/// Conversion service wrapping one model provider
#[derive(Debug, Clone)]
pub struct ConversionService {
    /// Provider implementation
    provider: Arc<dyn Provider>,

    /// Generation parameters sent with every call
    generation: GenerationConfig,

    /// Prompts for the configured dialect pair
    prompts: PromptBuilder,
}

impl ConversionService {
    /// Create a new conversion service
    pub fn new(
        provider: Arc<dyn Provider>,
        generation: GenerationConfig,
        source: SqlDialect,
        target: SqlDialect,
    ) -> Self {
        Self {
            provider,
            generation,
            prompts: PromptBuilder::new(source, target),
        }
    }

    /// Create a conversion service from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            providers::from_config(&config.model),
            config.model.generation.clone(),
            config.source_dialect,
            config.target_dialect,
        )
    }

    /// Model used by the provider
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Test the connection to the model provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Convert a source-dialect script to the target dialect
    ///
    /// # Returns
    /// * `Ok(String)` - The converted script from the first ```sql block
    /// * `Err(ConversionError)` - The script is empty, the call failed, or the
    ///   answer held no SQL block
    pub async fn convert(&self, source_sql: &str) -> Result<String, ConversionError> {
        if source_sql.trim().is_empty() {
            return Err(ConversionError::EmptyScript);
        }

        let prompt = self.prompts.conversion(source_sql);
        self.request_sql_block(&prompt).await
    }

    /// Ask the model to fix a converted script given the database error
    pub async fn repair(&self, converted_sql: &str, error_message: &str) -> Result<String, ConversionError> {
        if converted_sql.trim().is_empty() {
            return Err(ConversionError::EmptyScript);
        }

        let prompt = self.prompts.repair(converted_sql, error_message);
        self.request_sql_block(&prompt).await
    }

    /// Send one prompt and extract the fenced SQL block from the answer
    async fn request_sql_block(&self, prompt: &str) -> Result<String, ConversionError> {
        let start_time = Instant::now();

        let answer = self.provider.complete(prompt, &self.generation).await
            .map_err(|e| {
                error!("Can't invoke '{}'. Reason: {}", self.provider.model(), e);
                ConversionError::Provider(e)
            })?;

        debug!("'{}' answered in {:?}", self.provider.model(), start_time.elapsed());

        let model = self.provider.model().to_string();
        match extract_sql_block(&answer) {
            None => {
                warn!("Answer from '{}' contained no ```sql block", model);
                Err(ConversionError::MissingCodeBlock { model })
            }
            Some(sql) if sql.is_empty() => {
                warn!("Answer from '{}' held an empty ```sql block", model);
                Err(ConversionError::EmptyCodeBlock { model })
            }
            Some(sql) => Ok(sql),
        }
    }
}
