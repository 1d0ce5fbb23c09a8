//! The conversational agent core.
//!
//! A turn follows a bounded **Reason → Act → Observe** cycle:
//!
//! 1. **Receive** a user utterance for a session
//! 2. **Build context** (persona instruction + recent transcript + scratchpad)
//! 3. **Ask the model** for a decision via the configured provider
//! 4. **If it names a capability**: invoke it, record the observation, loop to step 3
//! 5. **If it is a final answer**: append the exchange to the session and return it
//!
//! Around the turn loop sit exit detection, the built-in personas, and the
//! interactive [`ConversationDriver`].

pub mod conversation;
pub mod decision;
pub mod exit;
pub mod persona;
pub mod prompt;
pub mod scratchpad;
pub mod turn;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use conversation::{ConversationDriver, ConversationEnd};
pub use decision::{Decision, ParsedDecision};
pub use exit::{ExitDetector, ExitReason, reply_signals_exit, user_requested_exit};
pub use persona::{Persona, PersonaKind};
pub use scratchpad::{ReasoningStep, StepAction};
pub use turn::{Degradation, TurnOutcome, TurnProcessor};
