/*!
 * Tests for the Ollama client
 */

use sqlshift::app_config::GenerationConfig;
use sqlshift::errors::ProviderError;
use sqlshift::providers::Provider;
use sqlshift::providers::ollama::{GenerationResponse, Ollama};

/// Test that a non-streamed answer deserializes with optional fields missing
#[test]
fn test_generation_response_withMinimalBody_shouldDeserialize() {
    let body = r#"{"model":"llama3.1","response":"```sql\nSELECT 1;\n```","done":true}"#;
    let response: GenerationResponse = serde_json::from_str(body).unwrap();

    assert!(response.done);
    assert_eq!(response.response, "```sql\nSELECT 1;\n```");
    assert_eq!(response.eval_count, None);
}

/// Test that an unreachable server is reported as a connection error
#[tokio::test]
async fn test_complete_withUnreachableServer_shouldBeConnectionError() {
    let client = Ollama::new("http://127.0.0.1:9", "llama3.1");

    let result = client.complete("Human: hi\n\nAssistant:", &GenerationConfig::default()).await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
    assert_eq!(client.model(), "llama3.1");
}
