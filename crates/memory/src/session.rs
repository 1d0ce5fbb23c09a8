//! Session store: per-conversation transcripts.
//!
//! Sessions are created lazily on first reference and live until they are
//! ended explicitly or evicted for inactivity. The transcript is append-only:
//! turns are never reordered or edited once recorded.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_core::message::{SessionKey, Turn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// One conversation's accumulated state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            turns: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    fn push(&mut self, turn: Turn) {
        self.last_active = turn.timestamp.max(self.last_active);
        self.turns.push(turn);
    }

    /// The last `window` turns, or all of them when `window` is 0.
    pub fn recent(&self, window: usize) -> &[Turn] {
        if window == 0 || self.turns.len() <= window {
            &self.turns
        } else {
            &self.turns[self.turns.len() - window..]
        }
    }
}

/// Owns every live session, shared across tasks behind an `Arc`.
///
/// Turns for a single key must come from one writer at a time; the store
/// guarantees map consistency, not turn ordering between racing writers.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the session for `key`, creating an empty one if needed.
    pub async fn get_or_create(&self, key: &SessionKey) -> Session {
        if let Some(session) = self.sessions.read().await.get(key) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(session = %key, "Creating session");
                Session::new(key.clone())
            })
            .clone()
    }

    /// Append one turn to the end of a session's transcript.
    pub async fn append(&self, key: &SessionKey, turn: Turn) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| Session::new(key.clone()))
            .push(turn);
    }

    /// Append a completed exchange, user turn first, under one lock.
    pub async fn append_exchange(&self, key: &SessionKey, user: Turn, assistant: Turn) {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(key.clone())
            .or_insert_with(|| Session::new(key.clone()));
        session.push(user);
        session.push(assistant);
    }

    /// Full transcript, oldest first. Empty for unknown keys.
    pub async fn transcript(&self, key: &SessionKey) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(key)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// The most recent `window` turns (all turns when `window` is 0).
    pub async fn recent(&self, key: &SessionKey, window: usize) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(key)
            .map(|s| s.recent(window).to_vec())
            .unwrap_or_default()
    }

    /// Tear a session down, returning its final state.
    pub async fn end(&self, key: &SessionKey) -> Option<Session> {
        let removed = self.sessions.write().await.remove(key);
        if let Some(session) = &removed {
            debug!(session = %key, turns = session.turns.len(), "Session ended");
        }
        removed
    }

    /// Drop sessions idle for at least `max_idle`. Returns how many were removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| {
            let idle = (now - s.last_active).to_std().unwrap_or_default();
            idle < max_idle
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<SessionKey> {
        self.sessions.read().await.keys().cloned().collect()
    }
}
