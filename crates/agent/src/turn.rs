//! Turn processor — one user utterance in, one reply out.
//!
//! Each turn runs a bounded reasoning loop against the generation service:
//!
//! 1. **Assemble** the context: system instruction, recent transcript,
//!    the utterance, and the scratchpad of earlier decisions
//! 2. **Ask** the model for a decision
//! 3. **Act**: invoke the named capability and loop back with its output,
//!    or finish with the final answer
//!
//! With an empty capability registry the model's text is the answer and
//! the loop always finishes after one request.
//!
//! Recoverable trouble (malformed output, unknown capability, capability
//! failure, iteration ceiling) still completes the turn with a fixed reply
//! and is reported through [`TurnOutcome::degraded`]. Generation failures
//! are returned as errors and leave the transcript untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parley_core::capability::CapabilityRegistry;
use parley_core::error::{CapabilityError, Error, ProviderError};
use parley_core::event::{DomainEvent, EventBus};
use parley_core::message::{Message, SessionKey, Turn};
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse};
use parley_memory::SessionStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decision::{self, Decision};
use crate::prompt;
use crate::scratchpad::{ReasoningStep, Scratchpad, StepAction};

/// Reply used when the iteration ceiling is reached.
pub const MAX_ITERATIONS_REPLY: &str = "I've reached the maximum number of reasoning steps for this message without settling on an answer. Could you rephrase or narrow down the question?";

/// Reply used when a turn cannot be completed normally.
pub const DEFAULT_APOLOGY: &str =
    "I'm sorry, something went wrong while I was working on that. Could you try asking again?";

/// Why a turn ended with a fallback reply instead of a model answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Degradation {
    /// The model's output could not be parsed, even after a retry.
    MalformedDecision { reason: String },
    /// The model asked for a capability that is not registered.
    UnknownCapability { name: String },
    /// The capability failed or timed out.
    CapabilityFailed { name: String, reason: String },
    /// The iteration ceiling was reached.
    IterationLimit,
}

/// The result of one processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// What was said to the user (and recorded in the transcript).
    pub reply: String,
    /// Reasoning trace, for inspection only.
    pub steps: Vec<ReasoningStep>,
    /// Generation requests made.
    pub iterations: usize,
    /// Capability invocations attempted.
    pub capability_calls: usize,
    pub degraded: Option<Degradation>,
}

/// Processes turns for any number of sessions.
pub struct TurnProcessor {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
    capabilities: Arc<CapabilityRegistry>,
    sessions: Arc<SessionStore>,
    event_bus: Arc<EventBus>,
    max_iterations: u32,
    call_timeout: Duration,
    history_window: usize,
    apology: String,
}

impl TurnProcessor {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        system_prompt: impl Into<String>,
        capabilities: Arc<CapabilityRegistry>,
        sessions: Arc<SessionStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            system_prompt: system_prompt.into(),
            capabilities,
            sessions,
            event_bus,
            max_iterations: 8,
            call_timeout: Duration::from_secs(60),
            history_window: 40,
            apology: DEFAULT_APOLOGY.to_string(),
        }
    }

    /// Set max reasoning requests per turn.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the timeout applied to every generation request and capability call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Limit how many prior turns are sent as context (0 = all).
    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    /// Set the max tokens per generation response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Replace the fallback reply for recoverable failures.
    pub fn with_apology(mut self, apology: impl Into<String>) -> Self {
        self.apology = apology.into();
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the model must answer with structured decisions.
    pub fn is_structured(&self) -> bool {
        !self.capabilities.is_empty()
    }

    /// Run one turn for `key`.
    ///
    /// On success the user turn and the reply have been appended to the
    /// session. On error nothing was recorded.
    pub async fn process(&self, key: &SessionKey, utterance: &str) -> Result<TurnOutcome, Error> {
        let history = self.sessions.recent(key, self.history_window).await;
        let structured = self.is_structured();
        let system = prompt::system_instruction(&self.system_prompt, &self.capabilities.list());
        let user_message = if structured {
            prompt::user_input(utterance)
        } else {
            utterance.to_string()
        };

        let mut pad = Scratchpad::new(self.max_iterations as usize);
        let mut capability_calls = 0usize;

        debug!(session = %key, structured, history = history.len(), "Turn starting");

        let (reply, degraded) = loop {
            if !pad.tick() {
                warn!(session = %key, max = self.max_iterations, "Max reasoning iterations reached");
                break (MAX_ITERATIONS_REPLY.to_string(), Some(Degradation::IterationLimit));
            }

            debug!(iteration = pad.iterations(), "Reasoning iteration");

            let mut messages = Vec::with_capacity(history.len() + pad.replay().len() + 2);
            messages.push(Message::system(&system));
            messages.extend(history.iter().map(Message::from));
            messages.push(Message::user(&user_message));
            messages.extend(pad.replay().iter().cloned());

            let response = self.generate(key, messages).await?;
            let raw = response.message.content;

            let parsed = if structured {
                decision::parse_structured(&raw)
            } else {
                decision::parse_direct(&raw)
            };

            match parsed.decision {
                Decision::FinalAnswer { text } => {
                    pad.record_final(parsed.thought, StepAction::FinalAnswer { text: text.clone() });
                    break (text, None);
                }
                Decision::Malformed { raw, reason } => {
                    if pad.corrections() > 0 {
                        warn!(session = %key, %reason, "Model output malformed after retry");
                        break (
                            self.apology.clone(),
                            Some(Degradation::MalformedDecision { reason }),
                        );
                    }
                    debug!(%reason, "Malformed decision, asking for a correction");
                    pad.record_correction(&raw, &reason);
                }
                Decision::Invoke { name, query } => {
                    if !self.capabilities.contains(&name) {
                        warn!(session = %key, capability = %name, "Model requested unknown capability");
                        pad.record_final(
                            parsed.thought,
                            StepAction::Invoke {
                                name: name.clone(),
                                query,
                            },
                        );
                        break (
                            self.apology.clone(),
                            Some(Degradation::UnknownCapability { name }),
                        );
                    }

                    capability_calls += 1;
                    match self.invoke_capability(&name, &query).await {
                        Ok(output) => {
                            pad.record_observation(&raw, parsed.thought, &name, &query, &output);
                        }
                        Err(e) => {
                            warn!(session = %key, capability = %name, error = %e, "Capability failed");
                            pad.record_final(
                                parsed.thought,
                                StepAction::Invoke {
                                    name: name.clone(),
                                    query,
                                },
                            );
                            break (
                                self.apology.clone(),
                                Some(Degradation::CapabilityFailed {
                                    name,
                                    reason: e.to_string(),
                                }),
                            );
                        }
                    }
                }
            }
        };

        self.sessions
            .append_exchange(key, Turn::user(utterance), Turn::assistant(&reply))
            .await;

        let iterations = pad.iterations();
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session: key.to_string(),
            iterations,
            degraded: degraded.is_some(),
            timestamp: Utc::now(),
        });

        info!(
            session = %key,
            iterations,
            capability_calls,
            degraded = degraded.is_some(),
            "Turn completed"
        );

        Ok(TurnOutcome {
            reply,
            steps: pad.into_steps(),
            iterations,
            capability_calls,
            degraded,
        })
    }

    async fn generate(
        &self,
        key: &SessionKey,
        messages: Vec<Message>,
    ) -> Result<ProviderResponse, Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![],
        };

        let response = match tokio::time::timeout(self.call_timeout, self.provider.complete(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProviderError::Timeout(format!(
                    "no response from {} within {}s",
                    self.provider.name(),
                    self.call_timeout.as_secs()
                ))
                .into());
            }
        };

        self.event_bus.publish(DomainEvent::ResponseGenerated {
            session: key.to_string(),
            model: response.model.clone(),
            tokens_used: response.usage.as_ref().map_or(0, |u| u.total_tokens),
            timestamp: Utc::now(),
        });

        Ok(response)
    }

    async fn invoke_capability(&self, name: &str, query: &str) -> Result<String, CapabilityError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(
            self.call_timeout,
            self.capabilities.invoke(name, query),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout {
                name: name.to_string(),
                timeout_secs: self.call_timeout.as_secs(),
            }),
        };

        self.event_bus.publish(DomainEvent::CapabilityInvoked {
            name: name.to_string(),
            success: result.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use parley_core::message::Speaker;

    fn processor(
        provider: Arc<SequentialMockProvider>,
        registry: CapabilityRegistry,
    ) -> TurnProcessor {
        TurnProcessor::new(
            provider,
            "mock-model",
            0.7,
            "You are Muse.",
            Arc::new(registry),
            Arc::new(SessionStore::new()),
            Arc::new(EventBus::default()),
        )
    }

    #[tokio::test]
    async fn direct_mode_replies_with_model_text() {
        let provider = Arc::new(SequentialMockProvider::single_text("გამარჯობა! 🍕"));
        let agent = processor(provider.clone(), CapabilityRegistry::new());
        let key = SessionKey::default();

        let outcome = agent.process(&key, "Hi").await.unwrap();
        assert_eq!(outcome.reply, "გამარჯობა! 🍕");
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.capability_calls, 0);
        assert!(outcome.degraded.is_none());
        assert_eq!(provider.call_count(), 1);

        // Direct mode sends no format instructions
        let request = provider.last_request().unwrap();
        assert_eq!(request.messages[0].content, "You are Muse.");
        assert_eq!(request.messages.last().unwrap().content, "Hi");
    }

    #[tokio::test]
    async fn structured_final_answer_without_capability() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_text_response(
            &final_answer_blob("Let's outline your plot!"),
        )]));
        let agent = processor(provider.clone(), registry_with(vec![echo_capability()]));

        let outcome = agent.process(&SessionKey::default(), "help me plot").await.unwrap();
        assert_eq!(outcome.reply, "Let's outline your plot!");
        assert_eq!(outcome.capability_calls, 0);

        let request = provider.last_request().unwrap();
        assert!(request.messages[0].content.contains("RESPONSE FORMAT INSTRUCTIONS"));
    }

    #[tokio::test]
    async fn invoke_then_answer_replays_observation() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response(&invoke_blob("echo", "dragons")),
            make_text_response(&final_answer_blob("Dragons are popular!")),
        ]));
        let agent = processor(provider.clone(), registry_with(vec![echo_capability()]));

        let outcome = agent.process(&SessionKey::default(), "dragons?").await.unwrap();
        assert_eq!(outcome.reply, "Dragons are popular!");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.capability_calls, 1);
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.steps[0].observation.as_deref(), Some("echo: dragons"));

        let request = provider.last_request().unwrap();
        let last = request.messages.last().unwrap();
        assert!(last.content.contains("TOOL RESPONSE"));
        assert!(last.content.contains("echo: dragons"));
    }

    #[tokio::test]
    async fn transcript_gains_one_exchange_per_turn() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("one"),
            make_text_response("two"),
            make_text_response("three"),
        ]));
        let agent = processor(provider, CapabilityRegistry::new());
        let key = SessionKey::from("alice");

        for text in ["a", "b", "c"] {
            agent.process(&key, text).await.unwrap();
        }

        let transcript = agent.sessions().transcript(&key).await;
        assert_eq!(transcript.len(), 6);
        assert_eq!(transcript[0].speaker, Speaker::User);
        assert_eq!(transcript[0].content, "a");
        assert_eq!(transcript[5].content, "three");
    }

    #[tokio::test]
    async fn history_is_sent_as_context() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("first reply"),
            make_text_response("second reply"),
        ]));
        let agent = processor(provider.clone(), CapabilityRegistry::new());
        let key = SessionKey::default();

        agent.process(&key, "first").await.unwrap();
        agent.process(&key, "second").await.unwrap();

        let request = provider.last_request().unwrap();
        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["You are Muse.", "first", "first reply", "second"]);
    }

    #[tokio::test]
    async fn history_window_limits_context_not_transcript() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("r1"),
            make_text_response("r2"),
            make_text_response("r3"),
        ]));
        let agent = processor(provider.clone(), CapabilityRegistry::new()).with_history_window(2);
        let key = SessionKey::default();

        for text in ["u1", "u2", "u3"] {
            agent.process(&key, text).await.unwrap();
        }

        let request = provider.last_request().unwrap();
        // system + 2 windowed turns + new utterance
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[1].content, "u2");
        assert_eq!(agent.sessions().transcript(&key).await.len(), 6);
    }

    #[tokio::test]
    async fn unknown_capability_apologises_and_records() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_text_response(
            &invoke_blob("summon_dragon", "now"),
        )]));
        let agent = processor(provider, registry_with(vec![echo_capability()]));
        let key = SessionKey::default();

        let outcome = agent.process(&key, "do magic").await.unwrap();
        assert_eq!(outcome.reply, DEFAULT_APOLOGY);
        assert_eq!(
            outcome.degraded,
            Some(Degradation::UnknownCapability {
                name: "summon_dragon".into()
            })
        );
        assert_eq!(outcome.capability_calls, 0);

        let transcript = agent.sessions().transcript(&key).await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, DEFAULT_APOLOGY);
    }

    #[tokio::test]
    async fn malformed_output_gets_one_retry() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("Sure! Here are some ideas."),
            make_text_response(&final_answer_blob("Here are some ideas.")),
        ]));
        let agent = processor(provider.clone(), registry_with(vec![echo_capability()]));

        let outcome = agent.process(&SessionKey::default(), "ideas?").await.unwrap();
        assert_eq!(outcome.reply, "Here are some ideas.");
        assert!(outcome.degraded.is_none());
        assert_eq!(provider.call_count(), 2);

        let request = provider.last_request().unwrap();
        assert!(request.messages.last().unwrap().content.contains("could not be understood"));
    }

    #[tokio::test]
    async fn malformed_twice_apologises() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("not json"),
            make_text_response("still not json"),
        ]));
        let agent = processor(provider.clone(), registry_with(vec![echo_capability()]));

        let outcome = agent.process(&SessionKey::default(), "ideas?").await.unwrap();
        assert_eq!(outcome.reply, DEFAULT_APOLOGY);
        assert!(matches!(
            outcome.degraded,
            Some(Degradation::MalformedDecision { .. })
        ));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn capability_failure_apologises() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_text_response(
            &invoke_blob("failing", "anything"),
        )]));
        let agent = processor(provider, registry_with(vec![failing_capability()]));

        let outcome = agent.process(&SessionKey::default(), "search").await.unwrap();
        assert_eq!(outcome.reply, DEFAULT_APOLOGY);
        assert_eq!(outcome.capability_calls, 1);
        assert!(matches!(
            outcome.degraded,
            Some(Degradation::CapabilityFailed { ref name, .. }) if name == "failing"
        ));
    }

    #[tokio::test]
    async fn iteration_ceiling_ends_turn() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response(&invoke_blob("echo", "1")),
            make_text_response(&invoke_blob("echo", "2")),
            make_text_response(&invoke_blob("echo", "3")),
        ]));
        let agent = processor(provider.clone(), registry_with(vec![echo_capability()]))
            .with_max_iterations(3);

        let outcome = agent.process(&SessionKey::default(), "loop").await.unwrap();
        assert_eq!(outcome.reply, MAX_ITERATIONS_REPLY);
        assert_eq!(outcome.degraded, Some(Degradation::IterationLimit));
        assert_eq!(outcome.iterations, 3);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn provider_error_leaves_transcript_unchanged() {
        let provider = Arc::new(SequentialMockProvider::failing(ProviderError::Network(
            "connection reset".into(),
        )));
        let agent = processor(provider, CapabilityRegistry::new());
        let key = SessionKey::default();

        let err = agent.process(&key, "hello").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
        assert!(agent.sessions().transcript(&key).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = Arc::new(
            SequentialMockProvider::single_text("too late").with_delay(Duration::from_secs(120)),
        );
        let agent = processor(provider, CapabilityRegistry::new())
            .with_call_timeout(Duration::from_secs(5));
        let key = SessionKey::default();

        let err = agent.process(&key, "hello").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Timeout(_))));
        assert!(agent.sessions().transcript(&key).await.is_empty());
    }

    #[tokio::test]
    async fn events_are_published() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response(&invoke_blob("echo", "x")),
            make_text_response(&final_answer_blob("done")),
        ]));
        let agent = processor(provider, registry_with(vec![echo_capability()]));
        let mut rx = agent.event_bus().subscribe();

        agent.process(&SessionKey::default(), "go").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event.as_ref() {
                DomainEvent::ResponseGenerated { .. } => "response",
                DomainEvent::CapabilityInvoked { .. } => "capability",
                DomainEvent::TurnCompleted { .. } => "turn",
                DomainEvent::SessionEnded { .. } => "ended",
            });
        }
        assert_eq!(kinds, vec!["response", "capability", "response", "turn"]);
    }
}
