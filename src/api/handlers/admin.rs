//! Waitlist administration handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{
    AdminWaitlistQuery, UpdateStatusRequest, WaitlistEntryDto, WaitlistListResponse,
};
use crate::app_state::AppState;
use crate::domain::WaitlistStatus;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::required;

/// `GET /api/admin/waitlist`: Page through registrations.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/admin/waitlist",
    tag = "Admin",
    summary = "List waitlist entries",
    description = "Newest first. `limit` is clamped to 1-500 (default 50).",
    params(AdminWaitlistQuery),
    responses(
        (status = 200, description = "Entries", body = WaitlistListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    )
)]
pub async fn list_waitlist(
    State(state): State<AppState>,
    query: Result<Query<AdminWaitlistQuery>, QueryRejection>,
) -> Result<Json<WaitlistListResponse>, GatewayError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<WaitlistStatus>)
        .transpose()?;
    let entries = state
        .waitlist
        .list(query.limit, query.offset, status)
        .await?
        .into_iter()
        .map(WaitlistEntryDto::from)
        .collect();
    Ok(Json(WaitlistListResponse { entries }))
}

/// `PUT /api/admin/waitlist/{id}/status`: Approve or reject an entry.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an unknown status, or
/// [`GatewayError::WaitlistEntryNotFound`] for an unknown ID.
#[utoipa::path(
    put,
    path = "/api/admin/waitlist/{id}/status",
    tag = "Admin",
    summary = "Update entry status",
    params(("id" = i64, Path, description = "Waitlist entry ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated entry", body = WaitlistEntryDto),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<WaitlistEntryDto>, GatewayError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let status = required("status", req.status.as_deref())?;
    let entry = state.waitlist.update_status(id, &status).await?;
    Ok(Json(WaitlistEntryDto::from(entry)))
}

/// Admin routes, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/waitlist", get(list_waitlist))
        .route("/admin/waitlist/{id}/status", put(update_status))
}
