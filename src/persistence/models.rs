//! Database row models and their conversion into domain types.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that
//! lexical order equals chronological order.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

use crate::domain::{
    Message, Role, Session, SessionId, Transaction, UserProfile, WaitlistEntry, WaitlistStatus,
};

/// Current time at storage precision (microseconds), so values read back
/// compare equal to the ones that were written.
#[must_use]
pub fn storage_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Formats a timestamp for storage.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp.
///
/// Accepts RFC 3339 and SQLite's `CURRENT_TIMESTAMP` layout
/// (`YYYY-MM-DD HH:MM:SS`, UTC). Unparsable values are logged and read as
/// the current time rather than failing the whole query.
#[must_use]
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    tracing::warn!(raw, "failed to parse stored timestamp; using now");
    Utc::now()
}

/// A row of the `sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    /// Session key.
    pub id: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last touch timestamp (RFC 3339).
    pub updated_at: String,
    /// JSON-encoded metadata.
    pub metadata: Option<String>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        let metadata = row
            .metadata
            .as_deref()
            .and_then(|raw| match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(value @ serde_json::Value::Object(_)) => Some(value),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(session_id = %row.id, error = %e, "malformed session metadata");
                    None
                }
            })
            .unwrap_or_else(|| serde_json::json!({}));
        Self {
            id: SessionId::from(row.id),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
            metadata,
        }
    }
}

/// A row of the `messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    /// Message key.
    pub id: String,
    /// Owning session key.
    pub session_id: String,
    /// Stored role name.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            session_id: SessionId::from(row.session_id),
            role: Role::from_stored(&row.role),
            content: row.content,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Wallet address.
    pub wallet_address: String,
    /// Display name.
    pub username: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            wallet_address: row.wallet_address,
            username: row.username,
            email: row.email,
            avatar_url: row.avatar_url,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

/// A row of the `transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    /// Row ID.
    pub id: i64,
    /// Wallet address.
    pub wallet_address: String,
    /// Transaction kind (`type` column).
    #[sqlx(rename = "type")]
    pub tx_type: String,
    /// Amount.
    pub amount: f64,
    /// Token symbol.
    pub symbol: Option<String>,
    /// Transaction timestamp.
    pub timestamp: String,
    /// Settlement status.
    pub status: Option<String>,
    /// On-chain hash.
    pub tx_hash: Option<String>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            wallet_address: row.wallet_address,
            tx_type: row.tx_type,
            amount: row.amount,
            symbol: row.symbol,
            timestamp: parse_timestamp(&row.timestamp),
            status: row.status.unwrap_or_else(|| "completed".to_string()),
            tx_hash: row.tx_hash,
        }
    }
}

/// A row of the `waitlist` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WaitlistRow {
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
    /// Stored status name.
    pub status: String,
    /// Registration timestamp.
    pub created_at: String,
}

impl From<WaitlistRow> for WaitlistEntry {
    fn from(row: WaitlistRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|_| {
            tracing::warn!(id = row.id, status = %row.status, "unknown waitlist status; reading as pending");
            WaitlistStatus::Pending
        });
        Self {
            id: row.id,
            wallet_address: row.wallet_address,
            name: row.name,
            email: row.email,
            reason: row.reason,
            status,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}
