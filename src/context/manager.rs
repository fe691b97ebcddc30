//! The context manager: trigger arithmetic, block compression, context view.
//!
//! One manager owns one conversation. It is single-caller by design: all
//! operations take `&mut self` or `&self` and there is no internal locking.
//! The only slow path is [`ContextManager::compress_if_needed`], which makes
//! at most one gateway call; dropping its future cancels the call and leaves
//! the manager untouched, because the summary is stored only after the call
//! resolves.

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::stats::ContextStats;
use super::summary::{SummaryBlock, render_digest, render_transcript, summary_prompt};
use super::{
    DEFAULT_COMPRESSION_WINDOW, DEFAULT_RECENT_WINDOW, SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE,
};
use crate::conversation::{History, Message, Role};
use crate::error::{Error, GatewayError, Result};
use crate::gateway::{ChatMessage, CompletionGateway, CompletionRequest};

/// Window parameters for a [`ContextManager`].
///
/// `compression_window` is the number of oldest uncompressed messages folded
/// into one summary; `recent_window` is the number of newest messages always
/// kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Messages summarized together as one block. Must be greater than zero.
    pub compression_window: usize,

    /// Newest messages never summarized. May be zero.
    pub recent_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            compression_window: DEFAULT_COMPRESSION_WINDOW,
            recent_window: DEFAULT_RECENT_WINDOW,
        }
    }
}

impl ContextConfig {
    /// Creates a configuration with the given windows.
    #[must_use]
    pub const fn new(compression_window: usize, recent_window: usize) -> Self {
        Self {
            compression_window,
            recent_window,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `compression_window` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.compression_window == 0 {
            return Err(Error::Config {
                message: "compression window must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Windowed compressor of conversation history.
///
/// The manager appends messages to an append-only [`History`], folds the
/// oldest block of uncompressed messages into a [`SummaryBlock`] once enough
/// accumulate before the recent window, and assembles the bounded context
/// view sent with the next completion request.
///
/// The completion gateway is an injected capability: any
/// [`CompletionGateway`] implementation works, including the scripted test
/// double.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chatfold::context::{ContextConfig, ContextManager};
/// use chatfold::conversation::Role;
/// use chatfold::gateway::ScriptedGateway;
///
/// # fn main() -> chatfold::Result<()> {
/// let gateway = Arc::new(ScriptedGateway::always("summary"));
/// let mut manager = ContextManager::new(gateway, ContextConfig::new(10, 6))?;
/// manager.add_message(Role::User, "hello");
/// assert_eq!(manager.history().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ContextManager {
    history: History,
    summaries: Vec<SummaryBlock>,
    config: ContextConfig,
    gateway: Arc<dyn CompletionGateway>,
}

impl ContextManager {
    /// Creates a manager with the given gateway and window configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configuration is invalid.
    pub fn new(gateway: Arc<dyn CompletionGateway>, config: ContextConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: History::new(),
            summaries: Vec::new(),
            config,
            gateway,
        })
    }

    /// Creates a manager with the default windows.
    #[must_use]
    pub fn with_defaults(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            history: History::new(),
            summaries: Vec::new(),
            config: ContextConfig::default(),
            gateway,
        }
    }

    /// Appends a message with the current timestamp.
    ///
    /// Never triggers compression; call
    /// [`compress_if_needed`](Self::compress_if_needed) for that.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Message::new(role, content));
    }

    /// Compresses the oldest uncompressed block when enough messages have
    /// accumulated before the recent window.
    ///
    /// At most one block is compressed per call. Returns the compressed
    /// source range, or `None` when compression was not needed (the common
    /// case; no gateway call is made then).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gateway`] when the summarization call fails. No
    /// state changes on failure: the trigger condition is unchanged and the
    /// same range is retried on the next call.
    pub async fn compress_if_needed(&mut self) -> Result<Option<Range<usize>>> {
        let Some(range) = self.pending_block() else {
            debug!(
                total = self.history.len(),
                uncompressed = self.uncompressed_count(),
                "compression not due"
            );
            return Ok(None);
        };

        debug!(
            start = range.start,
            end = range.end,
            total = self.history.len(),
            "compressing history block"
        );

        let text = self.summarize_block(range.clone()).await?;
        info!(
            start = range.start,
            end = range.end,
            summary_bytes = text.len(),
            "history block compressed"
        );
        self.summaries.push(SummaryBlock::new(range.clone(), text));
        Ok(Some(range))
    }

    /// Produces the bounded message list for the next completion request.
    ///
    /// One synthetic system message carrying the digest of all summaries
    /// (omitted while there are none), followed by the most recent
    /// `recent_window` raw messages. Recomputed on every call.
    #[must_use]
    pub fn context_for_request(&self) -> Vec<ChatMessage> {
        let tail = self.history.tail(self.config.recent_window);
        let mut context = Vec::with_capacity(tail.len() + 1);
        if let Some(digest) = render_digest(&self.summaries) {
            context.push(ChatMessage::system(digest));
        }
        context.extend(tail.iter().map(ChatMessage::from));
        context
    }

    /// Computes compression statistics. No side effects.
    #[must_use]
    pub fn stats(&self) -> ContextStats {
        ContextStats::compute(
            self.history.as_slice(),
            &self.summaries,
            self.config.recent_window,
        )
    }

    /// Clears history and summaries. Irreversible.
    pub fn reset(&mut self) {
        self.history.clear();
        self.summaries.clear();
    }

    /// Replaces the history wholesale (e.g. when loading a saved
    /// conversation). Summaries are derived state and are cleared.
    pub fn restore(&mut self, messages: Vec<Message>) {
        self.history = History::from(messages);
        self.summaries.clear();
    }

    /// Returns the full history.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Returns the summary blocks produced so far, oldest first.
    #[must_use]
    pub fn summaries(&self) -> &[SummaryBlock] {
        &self.summaries
    }

    /// Returns the window configuration.
    #[must_use]
    pub const fn config(&self) -> ContextConfig {
        self.config
    }

    /// Determines the next block to compress, if the trigger condition
    /// holds.
    ///
    /// The block always starts right after the last compressed range and is
    /// bounded by the recent-window boundary, so it covers exactly
    /// `compression_window` messages whenever the trigger fires.
    fn pending_block(&self) -> Option<Range<usize>> {
        if self.uncompressed_count() < self.config.compression_window {
            return None;
        }

        let compressible = self.history.len().saturating_sub(self.config.recent_window);
        let start = self.summaries.len() * self.config.compression_window;
        let end = (start + self.config.compression_window).min(compressible);
        Some(start..end)
    }

    /// Number of messages before the recent window not yet covered by a
    /// summary block.
    fn uncompressed_count(&self) -> usize {
        self.history
            .len()
            .saturating_sub(self.config.recent_window)
            .saturating_sub(self.summaries.len() * self.config.compression_window)
    }

    /// Summarizes one range of history via the gateway.
    async fn summarize_block(&self, range: Range<usize>) -> Result<String> {
        let prompt = summary_prompt(&render_transcript(self.history.range(range)));
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(SUMMARY_TEMPERATURE)
            .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self.gateway.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(GatewayError::EmptyCompletion.into());
        }
        Ok(response.content)
    }
}
