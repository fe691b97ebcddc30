//! # chatfold
//!
//! Windowed conversation-history compression for LLM chat sessions.
//!
//! Long conversations outgrow model context windows. chatfold keeps the full
//! history append-only and verbatim, folds the oldest messages into short
//! LLM-generated summaries block by block, and sends a bounded view
//! (summaries + recent tail) with each request instead of the whole
//! transcript.
//!
//! ## Features
//!
//! - **Windowed compression**: fixed-size blocks, each message summarized at
//!   most once, per-call summarization cost independent of history length
//! - **Bounded context view**: one synthetic digest message plus the most
//!   recent raw messages
//! - **Pluggable gateway**: an `OpenAI`-backed implementation and a scripted
//!   test double behind one async trait
//! - **Sessions**: the ask/answer loop with usage tracking and JSON history
//!   persistence

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod session;
pub mod usage;

// Re-export commonly used types at crate root
pub use error::{Error, GatewayError, HistoryError, Result};

// Re-export conversation types
pub use conversation::{History, Message, Role};

// Re-export context-compression types
pub use context::{ContextConfig, ContextManager, ContextStats, SummaryBlock, estimate_tokens};

// Re-export gateway types
pub use gateway::{
    ChatMessage, CompletionGateway, CompletionRequest, CompletionResponse, FinishReason,
    GatewayConfig, OpenAiGateway, ResponseFormat, ScriptStep, ScriptedGateway, TokenUsage,
};

// Re-export session types
pub use session::{Session, SessionConfig, SessionReply};

// Re-export usage-tracking types
pub use usage::{ModelPricing, UsageTracker};
