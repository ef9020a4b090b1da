//! Public waitlist handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    JoinWaitlistRequest, WaitlistCheckResponse, WaitlistCountResponse, WaitlistEntryDto,
    WalletQuery,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::required;

/// `GET /api/waitlist/check`: Is a wallet registered?
///
/// # Errors
///
/// Returns [`GatewayError`] if `walletAddress` is missing or on storage failure.
#[utoipa::path(
    get,
    path = "/api/waitlist/check",
    tag = "Waitlist",
    summary = "Check registration",
    params(WalletQuery),
    responses(
        (status = 200, description = "Registration state", body = WaitlistCheckResponse),
        (status = 400, description = "walletAddress missing", body = ErrorResponse),
    )
)]
pub async fn check(
    State(state): State<AppState>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Result<Json<WaitlistCheckResponse>, GatewayError> {
    let Query(query) = query?;
    let wallet = required("walletAddress", query.wallet_address.as_deref())?;
    let found = state.waitlist.check_exists(&wallet).await?;
    Ok(Json(WaitlistCheckResponse {
        exists: found.exists,
        entry: found.entry.map(WaitlistEntryDto::from),
    }))
}

/// `POST /api/waitlist/join`: Register a wallet.
///
/// # Errors
///
/// Returns [`GatewayError::AlreadyRegistered`] for a duplicate wallet, or
/// [`GatewayError::InvalidRequest`] for missing or malformed fields.
#[utoipa::path(
    post,
    path = "/api/waitlist/join",
    tag = "Waitlist",
    summary = "Join the waitlist",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 201, description = "Registered", body = WaitlistEntryDto),
        (status = 400, description = "Missing or malformed field", body = ErrorResponse),
        (status = 409, description = "Wallet already registered", body = ErrorResponse),
    )
)]
pub async fn join(
    State(state): State<AppState>,
    payload: Result<Json<JoinWaitlistRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let entry = state.waitlist.add(req.into()).await?;
    Ok((StatusCode::CREATED, Json(WaitlistEntryDto::from(entry))))
}

/// `GET /api/waitlist/count`: Number of registrations.
///
/// # Errors
///
/// Returns [`GatewayError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/waitlist/count",
    tag = "Waitlist",
    summary = "Count registrations",
    responses(
        (status = 200, description = "Registration count", body = WaitlistCountResponse),
    )
)]
pub async fn count(State(state): State<AppState>) -> Result<Json<WaitlistCountResponse>, GatewayError> {
    let count = state.waitlist.count().await?;
    Ok(Json(WaitlistCountResponse { count }))
}

/// Waitlist routes, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/waitlist/check", get(check))
        .route("/waitlist/join", post(join))
        .route("/waitlist/count", get(count))
}
