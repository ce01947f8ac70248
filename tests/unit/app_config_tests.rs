/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use sqlshift::app_config::{Config, ModelProvider, SnowflakeTokenType, TargetKind};
use sqlshift::dialects::SqlDialect;

/// Config with every value needed to pass validation against Snowflake
fn valid_snowflake_config() -> Config {
    let mut config = Config::default();
    config.model.active_provider_config_mut().api_key = "test-key".to_string();
    config.target.snowflake.account = "xy12345".to_string();
    config.target.snowflake.token = "token".to_string();
    config.target.snowflake.warehouse = "COMPUTE_WH".to_string();
    config.target.snowflake.database = "ANALYTICS".to_string();
    config.target.snowflake.schema = "PUBLIC".to_string();
    config
}

/// Test default configuration values
#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.source_dialect, SqlDialect::SqlServer);
    assert_eq!(config.target_dialect, SqlDialect::Snowflake);
    assert_eq!(config.model.provider, ModelProvider::Anthropic);
    assert_eq!(config.target.kind, TargetKind::Snowflake);
    assert_eq!(config.output.archive_name, "converted_procedures.zip");

    let generation = &config.model.generation;
    assert_eq!(generation.max_tokens, 2048);
    assert_eq!(generation.temperature, 0.0);
    assert_eq!(generation.top_p, 1.0);
    assert_eq!(generation.top_k, 250);
    assert_eq!(generation.stop_sequences, vec!["\n\nHuman:".to_string()]);
}

/// Test that the default config fails validation without credentials
#[test]
fn test_validate_withDefaultConfig_shouldRequireApiKey() {
    let error = Config::default().validate().unwrap_err();
    assert!(error.to_string().contains("API key"));
}

/// Test that a complete Snowflake config passes validation
#[test]
fn test_validate_withCompleteSnowflakeConfig_shouldSucceed() -> Result<()> {
    valid_snowflake_config().validate()
}

/// Test that each required Snowflake setting is checked
#[test]
fn test_validate_withMissingWarehouse_shouldFail() {
    let mut config = valid_snowflake_config();
    config.target.snowflake.warehouse = " ".to_string();

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("warehouse"));
}

/// Test that a statement timeout beyond the API maximum is rejected
#[test]
fn test_validate_withHugeStatementTimeout_shouldFail() {
    let mut config = valid_snowflake_config();
    config.target.snowflake.statement_timeout_secs = u64::MAX;

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("statement_timeout_secs"));
}

/// Test that identical dialects are rejected
#[test]
fn test_validate_withSameDialects_shouldFail() {
    let mut config = valid_snowflake_config();
    config.source_dialect = SqlDialect::Snowflake;

    assert!(config.validate().is_err());
}

/// Test that out-of-range sampling values are rejected
#[test]
fn test_validate_withTemperatureAboveOne_shouldFail() {
    let mut config = valid_snowflake_config();
    config.model.generation.temperature = 1.5;

    assert!(config.validate().is_err());
}

/// Test that Ollama with a SQLite target needs no credentials
#[test]
fn test_validate_withOllamaAndSqlite_shouldNotNeedSecrets() -> Result<()> {
    let mut config = Config::default();
    config.model.provider = ModelProvider::Ollama;
    config.target.kind = TargetKind::Sqlite;

    config.validate()
}

/// Test that a partial JSON file is completed with defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "source_dialect": "oracle",
        "target": {
            "kind": "snowflake",
            "snowflake": { "account": "acme", "token_type": "OAUTH" }
        }
    }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.source_dialect, SqlDialect::Oracle);
    assert_eq!(config.target_dialect, SqlDialect::Snowflake);
    assert_eq!(config.target.snowflake.token_type, SnowflakeTokenType::Oauth);
    assert_eq!(config.target.snowflake.statement_timeout_secs, 60);
    assert_eq!(config.model.generation.top_k, 250);
    assert_eq!(config.target.sqlite.path, ":memory:");

    Ok(())
}

/// Test that the active provider's settings are resolved
#[test]
fn test_model_accessors_shouldFollowActiveProvider() {
    let mut config = Config::default();
    assert_eq!(config.model.get_endpoint(), "https://api.anthropic.com");

    config.model.provider = ModelProvider::Ollama;
    assert_eq!(config.model.get_model(), "llama3.1");
    assert_eq!(config.model.get_timeout_secs(), 300);
}

/// Test provider names parse in any case
#[test]
fn test_model_provider_fromStr_shouldIgnoreCase() {
    assert_eq!("Ollama".parse::<ModelProvider>().unwrap(), ModelProvider::Ollama);
    assert!("openai".parse::<ModelProvider>().is_err());
}
