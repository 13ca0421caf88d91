//! Message and conversation history types.
//!
//! These are the value objects that flow through a chat turn:
//! user asks a question → pipeline assembles context → provider answers →
//! both turns are appended to the session history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The student asking questions
    User,
    /// The assistant
    Assistant,
    /// Persona and style instructions
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }
}

/// Ordered, append-only record of the turns in one chat session.
///
/// Growth is unbounded; readers only look at the tail via [`History::recent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    messages: Vec<Message>,

    /// When the first message was added
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl History {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.content.len() / 4).sum()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Which slot is COL106 in?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Which slot is COL106 in?");
    }

    #[test]
    fn history_tracks_updates() {
        let mut history = History::new();
        let created = history.created_at;

        history.push(Message::user("First message"));
        assert_eq!(history.len(), 1);
        assert!(history.updated_at >= created);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut history = History::new();
        for i in 0..5 {
            history.push(Message::user(format!("q{i}")));
        }

        let tail: Vec<&str> = history.recent(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["q3", "q4"]);
        assert_eq!(history.recent(10).len(), 5);
        assert!(History::new().recent(3).is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn history_token_estimate() {
        let mut history = History::new();
        // 20 chars ≈ 5 tokens
        history.push(Message::user("12345678901234567890"));
        assert_eq!(history.estimated_tokens(), 5);
    }
}
