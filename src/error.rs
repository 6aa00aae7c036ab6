//! Error types for the advisor chain.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Main error type for the advisor chain.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Invalid builder or chain configuration; raised at construction time,
    /// before any call is made.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The judge's textual output could not be parsed into an evaluation.
    /// Aborts the whole loop invocation, not just the current attempt.
    #[error("judge output parse error: {message}")]
    JudgeParse { message: String },

    /// Streaming invocation requested from a call-only advisor.
    #[error("unsupported invocation mode: {message}")]
    UnsupportedMode { message: String },

    /// Failure from the primary or judge model collaborator; propagated
    /// unchanged through the loop.
    #[error("model invocation error: {message}")]
    Model { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn judge_parse(message: impl Into<String>) -> Self {
        Self::JudgeParse {
            message: message.into(),
        }
    }

    pub fn unsupported_mode(message: impl Into<String>) -> Self {
        Self::UnsupportedMode {
            message: message.into(),
        }
    }

    pub fn model(message: impl std::fmt::Display) -> Self {
        Self::Model {
            message: message.to_string(),
        }
    }
}
