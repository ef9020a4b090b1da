//! Chat and session DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Message;

/// `POST /api/agent/chat` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Message text (required).
    pub message: Option<String>,
    /// Session to continue; a new one is created if absent or unknown.
    pub session_id: Option<String>,
}

/// The reply part of a [`ChatResponse`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatReplyDto {
    /// Assistant reply text.
    pub content: String,
    /// When the reply was recorded.
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/agent/chat` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Session the turn was recorded in.
    pub session_id: String,
    /// Assistant reply.
    pub response: ChatReplyDto,
}

/// `POST /api/agent/session` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// New session ID.
    pub session_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One message in a session history.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    /// Message ID.
    pub id: String,
    /// `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            role: m.role.as_str().to_string(),
            content: m.content,
            timestamp: m.created_at,
        }
    }
}

/// `GET /api/agent/session/{id}/history` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    /// Session ID.
    pub session_id: String,
    /// Messages, oldest first.
    pub history: Vec<MessageDto>,
}

/// `GET /api/agent/status` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusResponse {
    /// Active backend (`hosted` or `process`).
    pub backend: String,
    /// Whether the backend can produce replies.
    pub available: bool,
    /// Prior turns forwarded with each message.
    pub history_limit: usize,
}
