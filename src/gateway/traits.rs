//! Completion-gateway trait and request/response types.
//!
//! The gateway is the seam between conversation management and the LLM
//! provider. [`ContextManager`](crate::ContextManager) and
//! [`Session`](crate::Session) only ever talk to [`CompletionGateway`], so a
//! test double can stand in for the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conversation::{Message, Role};
use crate::error::Result;

/// A role-tagged text pair as submitted to the completion API.
///
/// Unlike [`Message`], a `ChatMessage` carries no timestamp: it is the wire
/// shape of a request, not a stored history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Output shape requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text (the provider default).
    Text,
    /// A single JSON object.
    Json,
}

/// A completion request.
///
/// Built with the `with_*` methods; unset options are omitted from the
/// provider call so its defaults apply.
///
/// # Examples
///
/// ```
/// use chatfold::gateway::{ChatMessage, CompletionRequest};
///
/// let request = CompletionRequest::new(vec![ChatMessage::user("hello")])
///     .with_temperature(0.3)
///     .with_max_tokens(150);
/// assert_eq!(request.temperature, Some(0.3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Ordered messages forming the prompt.
    pub messages: Vec<ChatMessage>,

    /// Model override; the gateway's configured model when `None`.
    pub model: Option<String>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Cap on generated tokens.
    pub max_tokens: Option<u32>,

    /// Sequences at which generation stops.
    pub stop: Vec<String>,

    /// Structured-output hint.
    pub response_format: Option<ResponseFormat>,
}

impl CompletionRequest {
    /// Creates a request with the given messages and no overrides.
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            stop: Vec::new(),
            response_format: None,
        }
    }

    /// Overrides the gateway's configured model for this request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Caps the number of generated tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets stop sequences.
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Requests a particular output shape.
    #[must_use]
    pub const fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of output.
    Stop,
    /// The token cap was reached; output is truncated.
    Length,
    /// The provider filtered the output.
    ContentFilter,
    /// Anything else the provider reports.
    Other,
}

impl FinishReason {
    /// Returns the wire-format name of the finish reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token accounting reported by the provider for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Prompt plus completion.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates a usage record; `total_tokens` is derived.
    #[must_use]
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,

    /// Model that produced the completion.
    pub model: String,

    /// Why generation stopped.
    pub finish_reason: FinishReason,

    /// Token accounting for the request.
    pub usage: TokenUsage,
}

/// Abstraction over an LLM completion backend.
///
/// Implementations own their transport concerns (timeouts, retries,
/// authentication). Callers hand over a [`CompletionRequest`] and get text
/// with token accounting back, or an error from the
/// [`GatewayError`](crate::GatewayError) taxonomy.
///
/// The trait object is `Send + Sync` so one gateway handle can be shared
/// across a session and its context manager.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Returns the backend name (e.g. `"openai"`).
    fn name(&self) -> &'static str;

    /// Returns the model used when a request carries no override.
    fn model(&self) -> &str;

    /// Executes a completion request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Request`](crate::GatewayError::Request) for
    /// transport/API failures and
    /// [`GatewayError::EmptyCompletion`](crate::GatewayError::EmptyCompletion)
    /// when the backend produced no usable text.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
