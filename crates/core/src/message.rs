//! Session, transcript and message domain types.
//!
//! Two shapes of text flow through the system:
//! - [`Turn`]s are what a session remembers: one user utterance or one
//!   assistant reply, append-only.
//! - [`Message`]s are what the generation service sees: turns plus the
//!   system instruction and the in-flight reasoning scratchpad.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::from("default-user")
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One utterance recorded in a session transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The role of a message sent to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, capability guidance)
    System,
    /// The end user, or the agent relaying an observation
    User,
    /// The model
    Assistant,
}

/// A single message in a generation request or response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        match turn.speaker {
            Speaker::User => Message::user(&turn.content),
            Speaker::Assistant => Message::assistant(&turn.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_converts_to_matching_role() {
        let user = Message::from(&Turn::user("I'd like a Margherita"));
        let bot = Message::from(&Turn::assistant("Great choice!"));
        assert_eq!(user.role, Role::User);
        assert_eq!(bot.role, Role::Assistant);
        assert_eq!(user.content, "I'd like a Margherita");
    }

    #[test]
    fn generated_keys_are_distinct() {
        assert_ne!(SessionKey::generate(), SessionKey::generate());
    }

    #[test]
    fn default_key_matches_single_user_mode() {
        assert_eq!(SessionKey::default().as_str(), "default-user");
    }

    #[test]
    fn session_key_converts_from_strings() {
        let borrowed: SessionKey = "author-1".into();
        let owned = SessionKey::from(String::from("author-1"));
        assert_eq!(borrowed, owned);
        assert_eq!(owned.to_string(), "author-1");
    }

    #[test]
    fn speaker_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::user("hi")).unwrap();
        assert!(json.contains("\"user\""));
    }
}
