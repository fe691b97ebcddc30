//! Completion-gateway abstraction and implementations.
//!
//! The [`CompletionGateway`] trait is the crate's only doorway to an LLM
//! provider. [`OpenAiGateway`] talks to the OpenAI chat API;
//! [`ScriptedGateway`] replays canned outcomes for tests.

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{ScriptStep, ScriptedGateway};
pub use openai::{DEFAULT_MODEL, GatewayConfig, OpenAiGateway};
pub use traits::{
    ChatMessage, CompletionGateway, CompletionRequest, CompletionResponse, FinishReason,
    ResponseFormat, TokenUsage,
};
