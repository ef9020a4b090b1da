//! Profile and transaction handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    ProfileDto, ProfileRequest, TransactionDto, TransactionListResponse, TransactionRequest,
    TransactionsQuery, WalletQuery, non_blank,
};
use crate::app_state::AppState;
use crate::domain::NewTransaction;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::required;

/// `GET /api/users/profile`: Profile of a wallet.
///
/// # Errors
///
/// Returns [`GatewayError`] if `walletAddress` is missing or on storage failure.
#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "Users",
    summary = "Get a profile",
    description = "Returns the stored profile, or an object with empty fields when the wallet has none.",
    params(WalletQuery),
    responses(
        (status = 200, description = "Profile", body = ProfileDto),
        (status = 400, description = "walletAddress missing", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    query: Result<Query<WalletQuery>, QueryRejection>,
) -> Result<Json<ProfileDto>, GatewayError> {
    let Query(query) = query?;
    let wallet = required("walletAddress", query.wallet_address.as_deref())?;
    let profile = state
        .users
        .get_profile(&wallet)
        .await?
        .map_or_else(|| ProfileDto::empty(wallet), ProfileDto::from);
    Ok(Json(profile))
}

/// `POST /api/users/profile`: Create or update a profile.
///
/// # Errors
///
/// Returns [`GatewayError`] if `walletAddress` is missing or on storage failure.
#[utoipa::path(
    post,
    path = "/api/users/profile",
    tag = "Users",
    summary = "Upsert a profile",
    description = "Creates the profile if absent. Fields left out of the body keep their stored value.",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Saved profile", body = ProfileDto),
        (status = 400, description = "walletAddress missing", body = ErrorResponse),
    )
)]
pub async fn upsert_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileDto>, GatewayError> {
    let Json(req) = payload?;
    let wallet = required("walletAddress", req.wallet_address.as_deref())?;
    let username = non_blank(req.username);
    let email = non_blank(req.email);
    let avatar_url = non_blank(req.avatar_url);
    let profile = state
        .users
        .upsert_profile(
            &wallet,
            username.as_deref(),
            email.as_deref(),
            avatar_url.as_deref(),
        )
        .await?;
    Ok(Json(ProfileDto::from(profile)))
}

/// `GET /api/users/transactions`: A wallet's transactions.
///
/// # Errors
///
/// Returns [`GatewayError`] if `walletAddress` is missing or on storage failure.
#[utoipa::path(
    get,
    path = "/api/users/transactions",
    tag = "Users",
    summary = "List transactions",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Transactions, newest first", body = TransactionListResponse),
        (status = 400, description = "walletAddress missing", body = ErrorResponse),
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, GatewayError> {
    let Query(query) = query?;
    let wallet = required("walletAddress", query.wallet_address.as_deref())?;
    let transactions = state
        .users
        .list_transactions(&wallet, query.limit)
        .await?
        .into_iter()
        .map(TransactionDto::from)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}

/// `POST /api/users/transactions`: Record a transaction.
///
/// # Errors
///
/// Returns [`GatewayError`] on a missing field or storage failure.
#[utoipa::path(
    post,
    path = "/api/users/transactions",
    tag = "Users",
    summary = "Record a transaction",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Recorded transaction", body = TransactionDto),
        (status = 400, description = "Missing field", body = ErrorResponse),
    )
)]
pub async fn add_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let wallet_address = required("walletAddress", req.wallet_address.as_deref())?;
    let tx_type = required("type", req.tx_type.as_deref())?;
    let amount = req.amount.ok_or_else(|| GatewayError::missing_field("amount"))?;

    let stored = state
        .users
        .add_transaction(NewTransaction {
            wallet_address,
            tx_type,
            amount,
            symbol: non_blank(req.symbol),
            timestamp: req.timestamp,
            status: non_blank(req.status),
            tx_hash: non_blank(req.tx_hash),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(TransactionDto::from(stored))))
}

/// User routes, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile).post(upsert_profile))
        .route(
            "/users/transactions",
            get(list_transactions).post(add_transaction),
        )
}
