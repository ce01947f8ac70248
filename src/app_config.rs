use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::dialects::SqlDialect;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. Credentials live here or in
/// the environment, never in source.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Dialect of the uploaded scripts
    #[serde(default)]
    pub source_dialect: SqlDialect,

    /// Dialect of the target database
    #[serde(default = "default_target_dialect")]
    pub target_dialect: SqlDialect,

    /// Model provider config
    #[serde(default)]
    pub model: ModelConfig,

    /// Target database config
    #[serde(default)]
    pub target: TargetConfig,

    /// Output files config
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Model provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    // @provider: Anthropic Messages API
    #[default]
    Anthropic,
    // @provider: Ollama
    Ollama,
}

impl ModelProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ModelProvider) -> Self {
        match provider_type {
            ModelProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            ModelProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_ollama_timeout_secs(),
            },
        }
    }
}

/// Fixed generation parameters sent with every model call
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, 0 keeps the output deterministic
    #[serde(default)]
    pub temperature: f32,

    /// Nucleus sampling mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top-k sampling bound
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Sequences that end generation (the end of the human turn)
    #[serde(default = "default_stop_sequences")]
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            top_p: default_top_p(),
            top_k: default_top_k(),
            stop_sequences: default_stop_sequences(),
        }
    }
}

/// Model service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: ModelProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Generation parameters shared by all providers
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            available_providers: vec![
                ProviderConfig::new(ModelProvider::Anthropic),
                ProviderConfig::new(ModelProvider::Ollama),
            ],
            generation: GenerationConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a mutable handle on the active provider configuration, adding one
    /// with defaults when the file did not list it
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self.available_providers.iter()
            .position(|p| p.provider_type == provider_str);
        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &ModelProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            ModelProvider::Anthropic => default_anthropic_model(),
            ModelProvider::Ollama => default_ollama_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            ModelProvider::Anthropic => default_anthropic_endpoint(),
            ModelProvider::Ollama => default_ollama_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }
}

/// Kind of target database
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Snowflake through its SQL API
    #[default]
    Snowflake,
    /// Local SQLite database file
    Sqlite,
}

/// How the Snowflake token is to be interpreted
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnowflakeTokenType {
    /// Key-pair JWT
    #[default]
    KeypairJwt,
    /// OAuth access token
    Oauth,
    /// Programmatic access token
    ProgrammaticAccessToken,
}

impl SnowflakeTokenType {
    // @returns: Value of the X-Snowflake-Authorization-Token-Type header
    pub fn header_value(&self) -> &'static str {
        match self {
            Self::KeypairJwt => "KEYPAIR_JWT",
            Self::Oauth => "OAUTH",
            Self::ProgrammaticAccessToken => "PROGRAMMATIC_ACCESS_TOKEN",
        }
    }
}

/// Snowflake connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SnowflakeConfig {
    /// Account URL or account identifier (e.g. "xy12345.eu-west-1.aws")
    #[serde(default)]
    pub account: String,

    /// Login name, informational for key-pair tokens
    #[serde(default)]
    pub user: String,

    /// Bearer token for the SQL API
    #[serde(default)]
    pub token: String,

    /// Token type sent alongside the token
    #[serde(default)]
    pub token_type: SnowflakeTokenType,

    /// Warehouse to run statements in
    #[serde(default)]
    pub warehouse: String,

    /// Database to create procedures in
    #[serde(default)]
    pub database: String,

    /// Schema to create procedures in
    #[serde(default)]
    pub schema: String,

    /// Role to run statements as (optional)
    #[serde(default)]
    pub role: String,

    /// Server-side statement timeout in seconds
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,

    /// Delay between status polls of a running statement
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            user: String::new(),
            token: String::new(),
            token_type: SnowflakeTokenType::default(),
            warehouse: String::new(),
            database: String::new(),
            schema: String::new(),
            role: String::new(),
            statement_timeout_secs: default_statement_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Longest statement timeout the Snowflake SQL API accepts (two days)
pub const MAX_STATEMENT_TIMEOUT_SECS: u64 = 172_800;

impl SnowflakeConfig {
    /// Base URL of the account, built from an account identifier when no
    /// scheme was given
    pub fn base_url(&self) -> Result<Url> {
        let account = self.account.trim().trim_end_matches('/');
        if account.is_empty() {
            return Err(anyhow!("Snowflake account is required"));
        }

        let raw = if account.starts_with("http://") || account.starts_with("https://") {
            account.to_string()
        } else if account.ends_with(".snowflakecomputing.com") {
            format!("https://{}", account)
        } else {
            format!("https://{}.snowflakecomputing.com", account)
        };

        Url::parse(&raw).map_err(|e| anyhow!("Invalid Snowflake account URL '{}': {}", raw, e))
    }
}

/// SQLite target settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SqliteConfig {
    /// Database file path, or ":memory:"
    #[serde(default = "default_sqlite_path")]
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

/// Target database configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TargetConfig {
    /// Which target to register scripts in
    #[serde(default)]
    pub kind: TargetKind,

    /// Snowflake settings
    #[serde(default)]
    pub snowflake: SnowflakeConfig,

    /// SQLite settings
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

/// Output files configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// File name of the archive of converted scripts
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    /// File name of the plain-text run report
    #[serde(default = "default_report_name")]
    pub report_name: String,

    /// Whether to write the run report
    #[serde(default = "default_true")]
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_name: default_archive_name(),
            report_name: default_report_name(),
            write_report: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_target_dialect() -> SqlDialect {
    SqlDialect::Snowflake
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_ollama_timeout_secs() -> u64 {
    300
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_top_p() -> f32 {
    1.0
}

fn default_top_k() -> u32 {
    250
}

fn default_stop_sequences() -> Vec<String> {
    vec!["\n\nHuman:".to_string()]
}

fn default_statement_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_sqlite_path() -> String {
    ":memory:".to_string()
}

fn default_archive_name() -> String {
    "converted_procedures.zip".to_string()
}

fn default_report_name() -> String {
    "sqlshift.report.log".to_string()
}

fn default_true() -> bool {
    true
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20240620".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

impl Config {

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_dialect == self.target_dialect {
            return Err(anyhow!(
                "Source and target dialect are both {}",
                self.source_dialect.display_name()
            ));
        }

        // API key is required for the hosted provider
        if self.model.provider == ModelProvider::Anthropic && self.model.get_api_key().is_empty() {
            return Err(anyhow!("Model API key is required for Anthropic provider"));
        }

        Url::parse(&self.model.get_endpoint())
            .map_err(|e| anyhow!("Invalid model endpoint '{}': {}", self.model.get_endpoint(), e))?;

        let generation = &self.model.generation;
        if generation.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&generation.temperature) {
            return Err(anyhow!("temperature must be between 0.0 and 1.0"));
        }
        if !(0.0..=1.0).contains(&generation.top_p) {
            return Err(anyhow!("top_p must be between 0.0 and 1.0"));
        }

        match self.target.kind {
            TargetKind::Snowflake => {
                let snowflake = &self.target.snowflake;
                snowflake.base_url()?;
                if snowflake.token.is_empty() {
                    return Err(anyhow!("Snowflake token is required"));
                }
                if snowflake.statement_timeout_secs > MAX_STATEMENT_TIMEOUT_SECS {
                    return Err(anyhow!(
                        "Snowflake statement_timeout_secs must be at most {}",
                        MAX_STATEMENT_TIMEOUT_SECS
                    ));
                }
                for (name, value) in [
                    ("warehouse", &snowflake.warehouse),
                    ("database", &snowflake.database),
                    ("schema", &snowflake.schema),
                ] {
                    if value.trim().is_empty() {
                        return Err(anyhow!("Snowflake {} is required", name));
                    }
                }
            },
            TargetKind::Sqlite => {
                if self.target.sqlite.path.trim().is_empty() {
                    return Err(anyhow!("SQLite path is required"));
                }
            },
        }

        if self.output.archive_name.trim().is_empty() {
            return Err(anyhow!("Archive name cannot be empty"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_dialect: SqlDialect::SqlServer,
            target_dialect: default_target_dialect(),
            model: ModelConfig::default(),
            target: TargetConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
