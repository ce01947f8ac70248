/*!
 * Mock provider implementation for testing.
 *
 * The mock provider simulates different model behaviors without network access:
 * - `MockProvider::working()` - Always answers with a fenced SQL block
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::prose_only()` - Answers without any fenced block
 * - `MockProvider::scripted(...)` - Replays a queue of canned answers
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::app_config::GenerationConfig;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always answers with the `<task>` body wrapped in a ```sql block
    Working,
    /// Always fails with an error
    Failing,
    /// Answers with prose and no fenced block
    ProseOnly,
}

/// A canned answer for the scripted mode
pub type MockAnswer = Result<String, ProviderError>;

#[derive(Debug, Default)]
struct MockState {
    /// Prompts received, in order
    prompts: Vec<String>,
    /// Canned answers consumed before falling back to the behavior
    scripted: VecDeque<MockAnswer>,
}

/// Mock provider for testing conversion behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Shared call log and answer queue
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that answers without a code block
    pub fn prose_only() -> Self {
        Self::new(MockBehavior::ProseOnly)
    }

    /// Create a mock that replays the given answers, then behaves as `Working`
    pub fn scripted(answers: Vec<MockAnswer>) -> Self {
        let provider = Self::working();
        provider.state.lock().expect("mock state poisoned").scripted = answers.into();
        provider
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.state.lock().expect("mock state poisoned").prompts.len()
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().expect("mock state poisoned").prompts.clone()
    }

    /// Wrap SQL in the fence a model would use
    pub fn fenced(sql: &str) -> String {
        format!("Here is the converted code:\n\n```sql\n{}\n```\n\nLet me know if you need changes.", sql)
    }

    /// Text between `<task>` and `</task>` in a prompt
    pub fn task_body(prompt: &str) -> &str {
        let start = prompt.find("<task>").map(|i| i + "<task>".len());
        let end = prompt.find("</task>");
        match (start, end) {
            (Some(start), Some(end)) if start <= end => prompt[start..end].trim(),
            _ => "",
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str, _generation: &GenerationConfig) -> Result<String, ProviderError> {
        let scripted = {
            let mut state = self.state.lock().expect("mock state poisoned");
            state.prompts.push(prompt.to_string());
            state.scripted.pop_front()
        };

        if let Some(answer) = scripted {
            return answer;
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::fenced(&format!("-- converted\n{}", Self::task_body(prompt)))),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::ProseOnly => Ok("I cannot convert this procedure.".to_string()),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }
}
