//! Chat messages and the append-only transcript of a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One chat message. Fields are private so a message cannot change after
/// it has been created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    role: ChatRole,
    content: String,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered chat history. Messages are only ever appended.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Indices of user messages whose turn failed to produce a reply
    failed_turns: Vec<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub(crate) fn mark_failed(&mut self, index: usize) {
        if index < self.messages.len() && !self.failed_turns.contains(&index) {
            self.failed_turns.push(index);
        }
    }

    pub fn is_failed(&self, index: usize) -> bool {
        self.failed_turns.contains(&index)
    }

    pub fn failed_turns(&self) -> &[usize] {
        &self.failed_turns
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

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_index_in_append_order() {
        let mut t = Transcript::new();
        assert_eq!(t.push(Message::assistant("hi")), 0);
        assert_eq!(t.push(Message::user("2+2")), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.last().map(Message::content), Some("2+2"));
        assert!(t.messages()[0].created_at() <= t.messages()[1].created_at());
    }

    #[test]
    fn failed_marks_are_deduplicated_and_bounded() {
        let mut t = Transcript::new();
        t.push(Message::user("q"));
        t.mark_failed(0);
        t.mark_failed(0);
        t.mark_failed(7);
        assert_eq!(t.failed_turns(), &[0]);
        assert!(t.is_failed(0));
    }

    #[test]
    fn serializes_roles_in_lowercase() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
        assert!(json["created_at"].is_string());
    }
}
