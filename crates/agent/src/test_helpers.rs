//! Shared test helpers for turn and conversation tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::capability::{Capability, CapabilityRegistry};
use parley_core::error::{CapabilityError, ProviderError};
use parley_core::message::Message;
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    call_count: Mutex<usize>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn scripted(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Create a provider that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Create a provider whose only call fails.
    pub fn failing(error: ProviderError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// Sleep before answering (use with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.requests.lock().unwrap().push(request);

        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let response = responses[*count].clone();
        *count += 1;
        response
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A fenced structured decision invoking `name`.
pub fn invoke_blob(name: &str, query: &str) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({ "action": name, "action_input": query })
    )
}

/// A fenced structured final answer.
pub fn final_answer_blob(text: &str) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({ "action": "Final Answer", "action_input": text })
    )
}

struct EchoCapability;

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the query"
    }
    async fn invoke(&self, query: &str) -> Result<String, CapabilityError> {
        Ok(format!("echo: {query}"))
    }
}

struct FailingCapability;

#[async_trait]
impl Capability for FailingCapability {
    fn name(&self) -> &str {
        "failing"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    async fn invoke(&self, _query: &str) -> Result<String, CapabilityError> {
        Err(CapabilityError::ExecutionFailed {
            name: "failing".into(),
            reason: "backend unavailable".into(),
        })
    }
}

pub fn echo_capability() -> Box<dyn Capability> {
    Box::new(EchoCapability)
}

pub fn failing_capability() -> Box<dyn Capability> {
    Box::new(FailingCapability)
}

pub fn registry_with(capabilities: Vec<Box<dyn Capability>>) -> CapabilityRegistry {
    CapabilityRegistry::from_capabilities(capabilities).unwrap()
}
