//! Append-only conversation history.
//!
//! The history is the message store backing a
//! [`ContextManager`](crate::ContextManager): messages are only ever appended
//! (or the whole store cleared), so indices are stable and summary ranges
//! recorded against them never dangle.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::{Message, Role};

/// Ordered, append-only sequence of conversation messages.
///
/// # Examples
///
/// ```
/// use chatfold::conversation::{History, Message};
///
/// let mut history = History::new();
/// let idx = history.push(Message::user("hello"));
/// assert_eq!(idx, 0);
/// assert_eq!(history.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Appends a message and returns its index.
    ///
    /// Indices are assigned monotonically and never reused until
    /// [`clear`](Self::clear).
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Checks whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the message at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Returns the messages in `range`, or an empty slice when the range is
    /// out of bounds.
    #[must_use]
    pub fn range(&self, range: Range<usize>) -> &[Message] {
        self.messages.get(range).unwrap_or(&[])
    }

    /// Returns the last `count` messages (all of them when the history is
    /// shorter).
    #[must_use]
    pub fn tail(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    /// Returns the last message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the most recent message with the given role, if any.
    #[must_use]
    pub fn last_from(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == role)
    }

    /// Returns the full message sequence as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// Iterates over the messages in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Removes all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Consumes the history, yielding the owned message sequence.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl From<Vec<Message>> for History {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
