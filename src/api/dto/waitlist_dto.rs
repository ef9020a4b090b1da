//! Waitlist DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{WaitlistEntry, WaitlistStatus};
use crate::service::JoinRequest;

/// `POST /api/waitlist/join` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitlistRequest {
    /// Wallet address (required).
    pub wallet_address: Option<String>,
    /// Applicant name (required).
    pub name: Option<String>,
    /// Applicant email (required).
    pub email: Option<String>,
    /// Why they want access.
    pub reason: Option<String>,
}

impl From<JoinWaitlistRequest> for JoinRequest {
    fn from(r: JoinWaitlistRequest) -> Self {
        Self {
            wallet_address: r.wallet_address,
            name: r.name,
            email: r.email,
            reason: r.reason,
        }
    }
}

/// A waitlist registration.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntryDto {
    /// Row ID.
    pub id: i64,
    /// Wallet address.
    pub wallet_address: String,
    /// Applicant name.
    pub name: String,
    /// Applicant email.
    pub email: String,
    /// Motivation.
    pub reason: Option<String>,
    /// Approval status.
    pub status: WaitlistStatus,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<WaitlistEntry> for WaitlistEntryDto {
    fn from(e: WaitlistEntry) -> Self {
        Self {
            id: e.id,
            wallet_address: e.wallet_address,
            name: e.name,
            email: e.email,
            reason: e.reason,
            status: e.status,
            created_at: e.created_at,
        }
    }
}

/// `GET /api/waitlist/check` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WaitlistCheckResponse {
    /// Whether the wallet is registered.
    pub exists: bool,
    /// The registration, when it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<WaitlistEntryDto>,
}

/// `GET /api/waitlist/count` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WaitlistCountResponse {
    /// Number of registrations.
    pub count: i64,
}

/// `GET /api/admin/waitlist` query.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminWaitlistQuery {
    /// Page size (1-500, default 50).
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
    /// `pending`, `approved` or `rejected`.
    pub status: Option<String>,
}

/// `GET /api/admin/waitlist` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WaitlistListResponse {
    /// Entries, newest first.
    pub entries: Vec<WaitlistEntryDto>,
}

/// `PUT /api/admin/waitlist/{id}/status` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// New status (required).
    pub status: Option<String>,
}
