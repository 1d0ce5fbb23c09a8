//! Exit detection: deciding when a conversation is over.
//!
//! Matching is plain substring search. User input is lower-cased first;
//! assistant replies are matched exactly as written, so reply phrases must
//! be listed in the case the model uses.

/// Why the conversation should end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed a bare `quit` or `exit`.
    QuitCommand,
    /// The user's input contained this exit phrase.
    UserPhrase(String),
    /// The assistant's reply contained this closing phrase.
    ReplyPhrase(String),
}

const QUIT_COMMANDS: [&str; 2] = ["quit", "exit"];

/// The first phrase contained in the lower-cased input, if any.
pub fn user_requested_exit<'a>(input: &str, phrases: &'a [String]) -> Option<&'a str> {
    let lowered = input.to_lowercase();
    phrases
        .iter()
        .map(String::as_str)
        .find(|p| lowered.contains(p))
}

/// The first phrase contained verbatim in the reply, if any.
pub fn reply_signals_exit<'a>(reply: &str, phrases: &'a [String]) -> Option<&'a str> {
    phrases
        .iter()
        .map(String::as_str)
        .find(|p| reply.contains(p))
}

/// Whether the input is a bare quit command.
pub fn is_quit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    QUIT_COMMANDS.contains(&normalized.as_str())
}

/// Phrase sets for one persona.
#[derive(Debug, Clone, Default)]
pub struct ExitDetector {
    user_phrases: Vec<String>,
    reply_phrases: Vec<String>,
}

impl ExitDetector {
    pub fn new<U, R>(user_phrases: U, reply_phrases: R) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            user_phrases: user_phrases.into_iter().map(Into::into).collect(),
            reply_phrases: reply_phrases.into_iter().map(Into::into).collect(),
        }
    }

    /// Check user input before it reaches the turn processor.
    pub fn check_input(&self, input: &str) -> Option<ExitReason> {
        if is_quit_command(input) {
            return Some(ExitReason::QuitCommand);
        }
        user_requested_exit(input, &self.user_phrases).map(|p| ExitReason::UserPhrase(p.to_string()))
    }

    /// Check an assistant reply after it has been shown.
    pub fn check_reply(&self, reply: &str) -> Option<ExitReason> {
        reply_signals_exit(reply, &self.reply_phrases).map(|p| ExitReason::ReplyPhrase(p.to_string()))
    }
}
