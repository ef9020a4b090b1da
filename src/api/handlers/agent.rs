//! Chat relay and session handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AgentStatusResponse, ChatReplyDto, ChatRequest, ChatResponse, CreateSessionResponse,
    HistoryResponse, MessageDto, SuccessResponse,
};
use crate::api::rate_limit::chat_rate_limit;
use crate::app_state::AppState;
use crate::domain::SessionId;
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::models::{format_timestamp, storage_now};
use crate::service::required;

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 8000;

/// Metadata recorded on a session created through the API.
fn session_metadata(headers: &HeaderMap) -> serde_json::Value {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    serde_json::json!({
        "createdAt": format_timestamp(storage_now()),
        "userAgent": user_agent,
    })
}

/// `POST /api/agent/chat`: Send a message and get the assistant's reply.
///
/// # Errors
///
/// Returns [`GatewayError`] on validation, upstream or storage failure.
#[utoipa::path(
    post,
    path = "/api/agent/chat",
    tag = "Agent",
    summary = "Send a chat message",
    description = "Records the message, forwards it with recent history to the reply backend and records the reply. A missing or unknown `sessionId` starts a new session.",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Missing or oversized message", body = ErrorResponse),
        (status = 429, description = "Chat rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Assistant temporarily unavailable", body = ErrorResponse),
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, GatewayError> {
    let Json(req) = payload?;
    let message = required("message", req.message.as_deref())?;
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(GatewayError::InvalidRequest(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SessionId::from);

    let reply = state
        .relay
        .chat(&message, session_id.as_ref(), session_metadata(&headers))
        .await?;

    Ok(Json(ChatResponse {
        session_id: reply.session_id.to_string(),
        response: ChatReplyDto {
            content: reply.content,
            timestamp: reply.timestamp,
        },
    }))
}

/// `POST /api/agent/session`: Start an empty session.
///
/// # Errors
///
/// Returns [`GatewayError::Storage`] on database failure.
#[utoipa::path(
    post,
    path = "/api/agent/session",
    tag = "Agent",
    summary = "Create a session",
    responses(
        (status = 200, description = "Session created", body = CreateSessionResponse),
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CreateSessionResponse>, GatewayError> {
    let session = state
        .sessions
        .create_session(session_metadata(&headers))
        .await?;
    Ok(Json(CreateSessionResponse {
        session_id: session.id.to_string(),
        created_at: session.created_at,
    }))
}

/// `GET /api/agent/session/{id}/history`: Messages of a session.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for unknown sessions.
#[utoipa::path(
    get,
    path = "/api/agent/session/{id}/history",
    tag = "Agent",
    summary = "Session history",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Messages, oldest first", body = HistoryResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn history(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<HistoryResponse>, GatewayError> {
    let Path(id) = id?;
    let id = SessionId::from(id);
    if state.sessions.get_session(&id).await?.is_none() {
        return Err(GatewayError::SessionNotFound(id.to_string()));
    }
    let history = state
        .sessions
        .get_messages(&id)
        .await?
        .into_iter()
        .map(MessageDto::from)
        .collect();
    Ok(Json(HistoryResponse {
        session_id: id.to_string(),
        history,
    }))
}

/// `DELETE /api/agent/session/{id}`: Clear a chat.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for unknown sessions.
#[utoipa::path(
    delete,
    path = "/api/agent/session/{id}",
    tag = "Agent",
    summary = "Delete a session and its messages",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session deleted", body = SuccessResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<SuccessResponse>, GatewayError> {
    let Path(id) = id?;
    let id = SessionId::from(id);
    if !state.sessions.delete_session(&id).await? {
        return Err(GatewayError::SessionNotFound(id.to_string()));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /api/agent/status`: Reply backend status.
#[utoipa::path(
    get,
    path = "/api/agent/status",
    tag = "Agent",
    summary = "Reply backend status",
    responses(
        (status = 200, description = "Active backend", body = AgentStatusResponse),
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<AgentStatusResponse> {
    Json(AgentStatusResponse {
        backend: state.relay.backend_name().to_string(),
        available: state.relay.backend_available(),
        history_limit: state.config.relay.history_limit,
    })
}

/// Agent routes, relative to `/api`. The chat route carries its own limiter.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/agent/chat",
            post(chat).route_layer(middleware::from_fn_with_state(
                state.clone(),
                chat_rate_limit,
            )),
        )
        .route("/agent/session", post(create_session))
        .route("/agent/session/{id}", delete(delete_session))
        .route("/agent/session/{id}/history", get(history))
        .route("/agent/status", get(status))
}
