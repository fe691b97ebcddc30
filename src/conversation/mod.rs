//! Conversation domain models.
//!
//! This module contains the fundamental data structures for conversation
//! state: role-tagged messages and the append-only history that stores them.
//! These are pure domain models with no I/O dependencies.

pub mod history;
pub mod message;

pub use history::History;
pub use message::{Message, Role};
