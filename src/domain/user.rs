//! User profiles keyed by wallet address and their transaction log.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Profile of a wallet owner.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Wallet address; unique.
    pub wallet_address: String,
    /// Display name.
    pub username: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last profile update.
    pub updated_at: DateTime<Utc>,
}

/// Append-only record of a wallet transaction.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// Row ID.
    pub id: i64,
    /// Wallet the transaction belongs to.
    pub wallet_address: String,
    /// Transaction kind, e.g. `buy`, `sell`, `transfer`.
    pub tx_type: String,
    /// Amount in units of `symbol`.
    pub amount: f64,
    /// Token symbol.
    pub symbol: Option<String>,
    /// When the transaction happened.
    pub timestamp: DateTime<Utc>,
    /// Settlement status; `completed` unless stated otherwise.
    pub status: String,
    /// On-chain transaction hash.
    pub tx_hash: Option<String>,
}

/// Fields for a new [`Transaction`].
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Wallet the transaction belongs to.
    pub wallet_address: String,
    /// Transaction kind.
    pub tx_type: String,
    /// Amount in units of `symbol`.
    pub amount: f64,
    /// Token symbol.
    pub symbol: Option<String>,
    /// Defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Defaults to `completed`.
    pub status: Option<String>,
    /// On-chain transaction hash.
    pub tx_hash: Option<String>,
}
