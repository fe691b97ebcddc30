//! Role-tagged conversation messages.
//!
//! Messages are the unit of conversation history. Each one carries a role,
//! immutable text content, and the Unix timestamp of its creation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker role attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Instructions and injected context.
    System,
}

impl Role {
    /// Returns the wire-format name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation entry.
///
/// Messages are immutable once created and owned exclusively by the
/// [`History`](crate::conversation::History) that holds them.
///
/// # Examples
///
/// ```
/// use chatfold::conversation::{Message, Role};
///
/// let msg = Message::user("What is the capital of France?");
/// assert_eq!(msg.role, Role::User);
/// assert!(msg.timestamp > 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Speaker role.
    pub role: Role,

    /// Message text.
    pub content: String,

    /// Unix timestamp (seconds) when the message was created.
    pub timestamp: i64,
}

impl Message {
    /// Creates a new message stamped with the current time.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: current_timestamp(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Checks whether the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Returns the current Unix timestamp in seconds.
#[allow(clippy::cast_possible_wrap)]
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Role::User).unwrap();
        assert_eq!(json, "\"user\"");

        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_message_new() {
        let msg = Message::new(Role::System, "be brief");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "be brief");
        assert!(msg.timestamp > 0);
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("q").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
        assert_eq!(Message::system("s").role, Role::System);
    }

    #[test]
    fn test_message_len() {
        let msg = Message::user("hello");
        assert_eq!(msg.len(), 5);
        assert!(!msg.is_empty());

        let empty = Message::user("");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_message_serialization_shape() {
        let msg = Message {
            role: Role::User,
            content: "hi".to_string(),
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["timestamp"], 1_700_000_000);
    }

    #[test]
    fn test_message_roundtrip() {
        let msg = Message::assistant("Paris.");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
