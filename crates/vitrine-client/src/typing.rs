//! Who is typing in which conversation.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use vitrine_shared::constants::DEFAULT_TYPING_TIMEOUT_SECS;
use vitrine_shared::types::{ConversationId, UserId};

/// Typing indicators keyed by conversation. An entry expires after
/// `timeout` even if the matching stop event never arrives.
#[derive(Debug)]
pub struct TypingTracker {
    me: UserId,
    timeout: Duration,
    entries: HashMap<ConversationId, HashMap<UserId, Instant>>,
}

impl TypingTracker {
    pub fn new(me: UserId) -> Self {
        Self::with_timeout(me, Duration::from_secs(DEFAULT_TYPING_TIMEOUT_SECS))
    }

    pub fn with_timeout(me: UserId, timeout: Duration) -> Self {
        Self {
            me,
            timeout,
            entries: HashMap::new(),
        }
    }

    /// Returns `false` for the local user, who is never shown as typing.
    pub fn start(&mut self, conversation: ConversationId, user: UserId, now: Instant) -> bool {
        if user == self.me {
            return false;
        }
        self.entries
            .entry(conversation)
            .or_default()
            .insert(user, now);
        true
    }

    pub fn stop(&mut self, conversation: &ConversationId, user: &UserId) {
        if let Some(users) = self.entries.get_mut(conversation) {
            users.remove(user);
            if users.is_empty() {
                self.entries.remove(conversation);
            }
        }
    }

    /// Users currently typing in `conversation`, sorted by id.
    pub fn typing_in(&self, conversation: &ConversationId, now: Instant) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .entries
            .get(conversation)
            .into_iter()
            .flatten()
            .filter(|(_, since)| now.duration_since(**since) < self.timeout)
            .map(|(user, _)| user.clone())
            .collect();
        users.sort();
        users
    }

    /// Drop expired entries.
    pub fn prune(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.entries.retain(|_, users| {
            users.retain(|_, since| now.duration_since(*since) < timeout);
            !users.is_empty()
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
