//! Conversation sessions.
//!
//! A [`Session`] wires a [`ContextManager`] and a [`CompletionGateway`] into
//! the ask/answer loop: each question is appended to history, due blocks are
//! compressed, the bounded context view is sent, and the reply is appended
//! back. The session also tracks token usage and persists raw history as
//! indented JSON.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::{ContextConfig, ContextManager, ContextStats, estimate_tokens};
use crate::conversation::{Message, Role};
use crate::error::{Error, HistoryError, Result};
use crate::gateway::{ChatMessage, CompletionGateway, CompletionRequest, TokenUsage};
use crate::usage::UsageTracker;

/// Sampling temperature used when the configuration does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Configuration for a [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Model override sent with each request; the gateway's configured
    /// model when `None`.
    pub model: Option<String>,

    /// Sampling temperature for answers (summarization uses its own).
    pub temperature: f32,

    /// Cap on generated tokens per answer.
    pub max_tokens: Option<u32>,

    /// System prompt prepended to every request.
    pub system_prompt: Option<String>,

    /// Compression windows for the underlying context manager.
    pub context: ContextConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            system_prompt: None,
            context: ContextConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a model override.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Caps generated tokens per answer.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the compression windows.
    #[must_use]
    pub const fn with_context(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }
}

/// One answered question.
#[derive(Debug, Clone)]
pub struct SessionReply {
    /// Generated answer text.
    pub content: String,

    /// Model that produced the answer.
    pub model: String,

    /// Token accounting for the request.
    pub usage: TokenUsage,

    /// Wall-clock time of the gateway call.
    pub elapsed: Duration,
}

/// Saved-history file shape: `{system_prompt, history, saved_at}`.
#[derive(Debug, Serialize, Deserialize)]
struct HistorySnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
    history: Vec<Message>,
    saved_at: i64,
}

/// A chat session with windowed history compression.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chatfold::gateway::ScriptedGateway;
/// use chatfold::session::{Session, SessionConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> chatfold::Result<()> {
/// let gateway = Arc::new(ScriptedGateway::always("Hello!"));
/// let mut session = Session::new(gateway, SessionConfig::new())?;
/// let reply = session.ask("Say hello").await?;
/// assert_eq!(reply.content, "Hello!");
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: SessionConfig,
    gateway: Arc<dyn CompletionGateway>,
    manager: ContextManager,
    usage: UsageTracker,
}

impl Session {
    /// Creates a session over the given gateway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the context configuration is invalid
    /// or its recent window is zero. A session needs `recent_window >= 1`
    /// so the question being asked survives into the context view.
    pub fn new(gateway: Arc<dyn CompletionGateway>, config: SessionConfig) -> Result<Self> {
        if config.context.recent_window == 0 {
            return Err(Error::Config {
                message: "session recent window must be at least 1".to_string(),
            });
        }
        let manager = ContextManager::new(Arc::clone(&gateway), config.context)?;
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| gateway.model().to_string());
        Ok(Self {
            config,
            gateway,
            manager,
            usage: UsageTracker::new(model),
        })
    }

    /// Asks a question and returns the answer.
    ///
    /// The question is appended to history first, due blocks are compressed
    /// (a compression failure is logged and the request proceeds
    /// uncompressed), the bounded context view is sent, and the answer is
    /// appended back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gateway`] when the completion call fails. The
    /// question stays in history so a retry sees the same conversation.
    pub async fn ask(&mut self, question: impl Into<String>) -> Result<SessionReply> {
        self.manager.add_message(Role::User, question);

        if let Err(err) = self.manager.compress_if_needed().await {
            warn!(error = %err, "history compression failed; continuing uncompressed");
        }

        let request = self.build_request();
        let started = Instant::now();
        let response = self.gateway.complete(request).await?;
        let elapsed = started.elapsed();

        self.manager
            .add_message(Role::Assistant, response.content.clone());
        self.usage.record(&response.usage);
        self.usage.set_context_tokens(self.estimate_context_tokens());

        info!(
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            elapsed = ?elapsed,
            "completion finished"
        );

        Ok(SessionReply {
            content: response.content,
            model: response.model,
            usage: response.usage,
            elapsed,
        })
    }

    /// Saves raw history as indented JSON: `{system_prompt, history,
    /// saved_at}`. Summaries are derived state and are not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::History`] when serialization or the write fails.
    pub fn save_history(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let snapshot = HistorySnapshot {
            system_prompt: self.config.system_prompt.clone(),
            history: self.manager.history().as_slice().to_vec(),
            saved_at: current_timestamp(),
        };

        let json = serde_json::to_string_pretty(&snapshot).map_err(HistoryError::from)?;
        std::fs::write(path, json).map_err(|err| HistoryError::WriteFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(())
    }

    /// Loads history saved by [`save_history`](Self::save_history),
    /// replacing the current history. A missing file is a successful no-op.
    /// The stored system prompt is adopted only when the session has none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::History`] when the read or deserialization fails.
    pub fn load_history(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(HistoryError::ReadFailed {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                }
                .into());
            }
        };

        let snapshot: HistorySnapshot = serde_json::from_str(&data).map_err(HistoryError::from)?;
        self.manager.restore(snapshot.history);
        if self.config.system_prompt.is_none() {
            self.config.system_prompt = snapshot.system_prompt;
        }
        Ok(())
    }

    /// Returns the most recent assistant message, if any.
    #[must_use]
    pub fn last_reply(&self) -> Option<&Message> {
        self.manager.history().last_from(Role::Assistant)
    }

    /// Clears history and summaries.
    pub fn clear(&mut self) {
        self.manager.reset();
    }

    /// Returns the underlying context manager.
    #[must_use]
    pub const fn context(&self) -> &ContextManager {
        &self.manager
    }

    /// Returns compression statistics for the conversation.
    #[must_use]
    pub fn stats(&self) -> ContextStats {
        self.manager.stats()
    }

    /// Returns the usage tracker.
    #[must_use]
    pub const fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Returns the configured system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.config.system_prompt.as_deref()
    }

    /// Replaces the system prompt.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.config.system_prompt = Some(prompt.into());
    }

    /// Assembles the request for the current conversation state.
    fn build_request(&self) -> CompletionRequest {
        let mut messages = Vec::new();
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend(self.manager.context_for_request());

        let mut request =
            CompletionRequest::new(messages).with_temperature(self.config.temperature);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    /// Estimates the token size of the request that would be sent now.
    fn estimate_context_tokens(&self) -> usize {
        let system = self
            .config
            .system_prompt
            .as_deref()
            .map_or(0, estimate_tokens);
        let view: usize = self
            .manager
            .context_for_request()
            .iter()
            .map(|message| estimate_tokens(&message.content))
            .sum();
        system + view
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
