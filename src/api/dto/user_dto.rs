//! Profile and transaction DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Transaction, UserProfile};

/// `POST /api/users/profile` body. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    /// Wallet address (required).
    pub wallet_address: Option<String>,
    /// Display name.
    pub username: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

/// A user profile. Unknown wallets get an object with empty fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    /// Wallet address.
    pub wallet_address: String,
    /// Display name.
    pub username: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Creation time, absent for unknown wallets.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update, absent for unknown wallets.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileDto {
    /// Placeholder returned for a wallet with no stored profile.
    #[must_use]
    pub const fn empty(wallet_address: String) -> Self {
        Self {
            wallet_address,
            username: None,
            email: None,
            avatar_url: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<UserProfile> for ProfileDto {
    fn from(p: UserProfile) -> Self {
        Self {
            wallet_address: p.wallet_address,
            username: p.username,
            email: p.email,
            avatar_url: p.avatar_url,
            created_at: Some(p.created_at),
            updated_at: Some(p.updated_at),
        }
    }
}

/// `GET /api/users/transactions` query.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct TransactionsQuery {
    /// Wallet address (required).
    pub wallet_address: Option<String>,
    /// Maximum rows (1-100, default 20).
    pub limit: Option<i64>,
}

/// `POST /api/users/transactions` body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Wallet address (required).
    pub wallet_address: Option<String>,
    /// Kind, e.g. `buy` (required).
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    /// Amount (required).
    pub amount: Option<f64>,
    /// Token symbol.
    pub symbol: Option<String>,
    /// When it happened; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Settlement status; defaults to `completed`.
    pub status: Option<String>,
    /// On-chain hash.
    pub tx_hash: Option<String>,
}

/// A recorded transaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    /// Row ID.
    pub id: i64,
    /// Wallet address.
    pub wallet_address: String,
    /// Kind.
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Amount.
    pub amount: f64,
    /// Token symbol.
    pub symbol: Option<String>,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Settlement status.
    pub status: String,
    /// On-chain hash.
    pub tx_hash: Option<String>,
}

impl From<Transaction> for TransactionDto {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            wallet_address: t.wallet_address,
            tx_type: t.tx_type,
            amount: t.amount,
            symbol: t.symbol,
            timestamp: t.timestamp,
            status: t.status,
            tx_hash: t.tx_hash,
        }
    }
}

/// `GET /api/users/transactions` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionDto>,
}
