//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Services
//! return it, and [`IntoResponse`] is the only place where a variant turns
//! into an HTTP status code and a JSON body.

use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

static EXPOSE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Enables or disables internal error text in 500 response bodies.
///
/// Off unless set. Only the first call takes effect; startup sets it from
/// `EXPOSE_ERROR_DETAILS`.
pub fn set_expose_details(enabled: bool) {
    if EXPOSE_DETAILS.set(enabled).is_err() {
        tracing::debug!("error detail exposure already configured; ignoring");
    }
}

fn expose_details() -> bool {
    EXPOSE_DETAILS.get().copied().unwrap_or(false)
}

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": "Wallet address already registered",
///   "code": 2101,
///   "message": "0xabc... is already on the waitlist"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short human-readable error summary.
    pub error: String,
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Longer explanation, when one helps the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Suggested next step for the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    /// Internal error text; only present in debug configurations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status               |
/// |-----------|---------------------|---------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request           |
/// | 2000–2999 | Not Found/Conflict  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Upstream   | 500 Internal Server Error / 408 Request Timeout |
/// | 429       | Rate limiting       | 429 Too Many Requests     |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed (missing or malformed field).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Chat session with the given ID does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Waitlist entry with the given ID does not exist.
    #[error("waitlist entry not found: {0}")]
    WaitlistEntryNotFound(i64),

    /// Wallet address is already present on the waitlist.
    #[error("wallet address already registered: {0}")]
    AlreadyRegistered(String),

    /// Reply backend failed, timed out or is not configured.
    #[error("agent upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The whole request outlived the HTTP request timeout.
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    /// Database failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Client exceeded rate limit.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::SessionNotFound(_) => 2001,
            Self::WaitlistEntryNotFound(_) => 2002,
            Self::AlreadyRegistered(_) => 2101,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::UpstreamUnavailable(_) => 3002,
            Self::RequestTimeout(_) => 3003,
            Self::RateLimited { .. } => 429,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) | Self::WaitlistEntryNotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered(_) => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Builds an [`GatewayError::InvalidRequest`] naming a missing field.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::InvalidRequest(format!("{field} is required"))
    }

    /// Wraps a database error, mapping unique-key violations on the
    /// waitlist to [`GatewayError::AlreadyRegistered`].
    #[must_use]
    pub fn from_sqlx(err: &sqlx::Error, wallet_address: Option<&str>) -> Self {
        if let Some(db_err) = err.as_database_error()
            && db_err.is_unique_violation()
            && let Some(wallet) = wallet_address
        {
            return Self::AlreadyRegistered(wallet.to_string());
        }
        Self::Storage(err.to_string())
    }

    fn body(&self) -> ErrorResponse {
        let code = self.error_code();
        let details = expose_details().then(|| self.to_string());
        match self {
            Self::InvalidRequest(msg) => ErrorResponse {
                error: msg.clone(),
                code,
                message: None,
                tip: None,
                details: None,
            },
            Self::SessionNotFound(_) => ErrorResponse {
                error: "Session not found".to_string(),
                code,
                message: Some(self.to_string()),
                tip: Some("Create a new session or send a message without a sessionId".to_string()),
                details: None,
            },
            Self::WaitlistEntryNotFound(_) => ErrorResponse {
                error: "Waitlist entry not found".to_string(),
                code,
                message: Some(self.to_string()),
                tip: None,
                details: None,
            },
            Self::AlreadyRegistered(wallet) => ErrorResponse {
                error: "Wallet address already registered".to_string(),
                code,
                message: Some(format!("{wallet} is already on the waitlist")),
                tip: None,
                details: None,
            },
            Self::UpstreamUnavailable(_) => ErrorResponse {
                error: "The assistant is temporarily unavailable".to_string(),
                code,
                message: Some("Your message was saved but no reply could be generated".to_string()),
                tip: Some("Please try again in a moment".to_string()),
                details,
            },
            Self::RequestTimeout(_) => ErrorResponse {
                error: "Request timed out".to_string(),
                code,
                message: Some(self.to_string()),
                tip: Some("Please try again in a moment".to_string()),
                details: None,
            },
            Self::RateLimited { retry_after_ms } => ErrorResponse {
                error: "Too many requests".to_string(),
                code,
                message: Some(format!(
                    "Rate limit exceeded, retry in {} seconds",
                    retry_after_ms.div_ceil(1000)
                )),
                tip: None,
                details: None,
            },
            Self::Storage(_) | Self::Internal(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                code,
                message: None,
                tip: None,
                details,
            },
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(e) => tracing::error!(error = %e, "storage error"),
            Self::Internal(e) => tracing::error!(error = %e, "internal error"),
            Self::UpstreamUnavailable(e) => tracing::warn!(error = %e, "upstream unavailable"),
            Self::RequestTimeout(after) => tracing::warn!(?after, "request timed out"),
            _ => {}
        }

        let status = self.status_code();
        let retry_after = match &self {
            Self::RateLimited { retry_after_ms } => {
                HeaderValue::from_str(&retry_after_ms.div_ceil(1000).max(1).to_string()).ok()
            }
            _ => None,
        };

        let mut response = axum::Json(self.body()).into_response();
        *response.status_mut() = status;
        if let Some(value) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
