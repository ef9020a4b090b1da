//! Reply-producing backends behind the agent relay.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Speaker of one turn in the context forwarded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Instructions placed before the conversation.
    System,
    /// Human turn.
    User,
    /// Agent turn.
    Assistant,
}

/// One entry of the context forwarded to a backend.
///
/// Serializes as an OpenAI-style `{ "role": ..., "content": ... }` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    /// Speaker.
    pub role: TurnRole,
    /// Text.
    pub content: String,
}

impl ChatTurn {
    /// Creates a system turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Why an upstream could not produce a reply.
///
/// These never reach clients verbatim; the relay logs them and answers
/// with a generic "temporarily unavailable" error.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Backend lacks required configuration (e.g. API key).
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// Neither the preferred nor the fallback interpreter is installed.
    #[error("no agent interpreter available")]
    InterpreterUnavailable,

    /// No reply within the configured deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// Hosted API answered with a non-success status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Hosted API answered with an unexpected body.
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Network-level failure talking to the hosted API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Agent process could not be started.
    #[error("failed to spawn agent process: {0}")]
    Spawn(String),

    /// Agent process exited unsuccessfully without output.
    #[error("agent process exited with {code:?}: {stderr}")]
    ProcessFailed {
        /// Exit code, `None` if killed by a signal.
        code: Option<i32>,
        /// Captured standard error (truncated).
        stderr: String,
    },

    /// Backend produced an empty reply.
    #[error("upstream produced an empty reply")]
    EmptyReply,
}

/// A strategy that turns a conversation context into a reply.
///
/// The last entry of `context` is always the new user turn.
#[async_trait]
pub trait ReplyBackend: Send + Sync + fmt::Debug {
    /// Short backend name for logs and the status endpoint.
    fn name(&self) -> &'static str;

    /// Whether the backend can currently produce replies at all.
    fn is_available(&self) -> bool;

    /// Produces a reply for `context`.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] when no reply could be produced.
    async fn reply(&self, context: &[ChatTurn]) -> Result<String, UpstreamError>;
}
