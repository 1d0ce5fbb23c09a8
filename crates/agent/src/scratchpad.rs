//! Scratchpad: the reasoning record for a single turn.
//!
//! Holds the decisions taken so far, the capability observations, and the
//! messages that replay them to the model on the next iteration. It also
//! owns the iteration budget. Nothing here outlives the turn: only the
//! final exchange reaches the session store.

use parley_core::message::Message;
use serde::{Deserialize, Serialize};

use crate::prompt;

/// What a reasoning step decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepAction {
    Invoke { name: String, query: String },
    FinalAnswer { text: String },
}

/// One decision and, for invocations, what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub action: StepAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Scratchpad {
    steps: Vec<ReasoningStep>,
    replay: Vec<Message>,
    iterations: usize,
    max_iterations: usize,
    corrections: usize,
}

impl Scratchpad {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            steps: Vec::new(),
            replay: Vec::new(),
            iterations: 0,
            max_iterations,
            corrections: 0,
        }
    }

    /// Count one reasoning request. Returns `false` once the budget is spent.
    pub fn tick(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    /// Record a capability call and its output; both are replayed next time.
    pub fn record_observation(
        &mut self,
        raw_reply: &str,
        thought: Option<String>,
        name: &str,
        query: &str,
        output: &str,
    ) {
        self.steps.push(ReasoningStep {
            thought,
            action: StepAction::Invoke {
                name: name.to_string(),
                query: query.to_string(),
            },
            observation: Some(output.to_string()),
        });
        self.replay.push(Message::assistant(raw_reply));
        self.replay.push(Message::user(prompt::observation(output)));
    }

    /// Record a decision that ends the turn (no observation follows).
    pub fn record_final(&mut self, thought: Option<String>, action: StepAction) {
        self.steps.push(ReasoningStep {
            thought,
            action,
            observation: None,
        });
    }

    /// Ask the model to restate an unparseable reply.
    pub fn record_correction(&mut self, raw_reply: &str, reason: &str) {
        self.corrections += 1;
        self.replay.push(Message::assistant(raw_reply));
        self.replay.push(Message::user(prompt::format_correction(reason)));
    }

    /// Messages to append after the user's input on the next request.
    pub fn replay(&self) -> &[Message] {
        &self.replay
    }

    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<ReasoningStep> {
        self.steps
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn corrections(&self) -> usize {
        self.corrections
    }
}
