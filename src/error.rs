//! Error types for chatfold operations.
//!
//! This module provides the error hierarchy using `thiserror` for all
//! conversation-compression operations: completion-gateway calls, history
//! persistence, and configuration validation.

use thiserror::Error;

/// Result type alias for chatfold operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for chatfold operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Completion-gateway errors (network, API, empty responses).
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// History persistence errors (file operations, serialization).
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Gateway-specific errors for completion requests.
///
/// Neither variant is fatal to a [`ContextManager`](crate::ContextManager):
/// a failed compression leaves state unchanged and the same block is retried
/// on the next call.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport or API failure reported by the completion backend.
    #[error("completion request failed: {0}")]
    Request(String),

    /// The backend answered but produced no usable text (zero choices or a
    /// blank completion).
    #[error("completion returned no text")]
    EmptyCompletion,
}

/// Persistence-specific errors for history files.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Failed to read a history file.
    #[error("failed to read history: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write a history file.
    #[error("failed to write history: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("history serialization error: {0}")]
    Serialization(String),
}

// Implement From traits for foreign errors

impl From<async_openai::error::OpenAIError> for GatewayError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Request(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Gateway(GatewayError::Request(err.to_string()))
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::History(HistoryError::Serialization(err.to_string()))
    }
}
