//! The `error` module defines the error type shared by the broker and clients.
//!
//! Routing misses (no matching pattern, subscriber already gone) are not
//! errors and never show up here. What remains are caller mistakes that can
//! be reported synchronously.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    /// Subscription pattern rejected at subscribe time.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Concrete topic rejected at publish time.
    #[error("invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A client needs a Tokio runtime to host its dispatch loop.
    #[error("no Tokio runtime available to start the dispatch loop")]
    NoRuntime,
}

impl McpError {
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_topic(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTopic {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
