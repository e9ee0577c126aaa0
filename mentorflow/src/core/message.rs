//! Conversation messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human on the other side of the chat.
    User,
    /// A message produced by the pipeline itself.
    System,
    /// A reply from the text-completion service.
    Assistant,
}

impl Role {
    /// The transcript type label for this role (`human`, `system`, `ai`).
    #[must_use]
    pub fn transcript_type(self) -> &'static str {
        match self {
            Self::User => "human",
            Self::System => "system",
            Self::Assistant => "ai",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single immutable chat message.
///
/// Fields are private so a message cannot change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    /// Creates a message with the given role.
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Returns the author role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Message::user("hi").role(), Role::User);
        assert_eq!(Message::system("hi").role(), Role::System);
        assert_eq!(Message::assistant("hi").text(), "hi");
    }

    #[test]
    fn test_transcript_types() {
        assert_eq!(Role::User.transcript_type(), "human");
        assert_eq!(Role::System.transcript_type(), "system");
        assert_eq!(Role::Assistant.transcript_type(), "ai");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_value(Message::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "text": "ok"}));
    }
}
