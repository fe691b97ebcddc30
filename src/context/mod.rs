//! Windowed conversation-context compression.
//!
//! This module is the core of the crate. A [`ContextManager`] owns the full
//! conversation history, folds the oldest uncompressed block of messages
//! into a gateway-generated summary once enough of them accumulate, and
//! assembles the bounded context view (summaries + recent tail) sent with
//! the next completion request.
//!
//! Compression is windowed and never overlapping: each message is summarized
//! at most once, so summarization cost stays linear in conversation length.
//! Existing summaries are never merged or re-summarized, which means the
//! summary preamble grows with conversation length.

pub mod manager;
pub mod stats;
pub mod summary;

pub use manager::{ContextConfig, ContextManager};
pub use stats::{ContextStats, estimate_tokens};
pub use summary::SummaryBlock;

/// Default number of oldest uncompressed messages folded into one summary.
pub const DEFAULT_COMPRESSION_WINDOW: usize = 10;

/// Default number of newest messages always kept verbatim.
pub const DEFAULT_RECENT_WINDOW: usize = 6;

/// Sampling temperature for summarization requests.
/// Low randomness keeps summaries factual.
pub const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Output-token cap for summarization requests.
pub const SUMMARY_MAX_TOKENS: u32 = 150;

/// Approximate characters per token used by [`estimate_tokens`].
/// A deliberate heuristic, not a tokenizer.
pub const CHARS_PER_TOKEN: usize = 3;
