//! User profile and transaction queries.

use super::models::{TransactionRow, UserRow, format_timestamp, storage_now};
use super::sqlite::SqlitePersistence;
use crate::domain::{NewTransaction, Transaction, UserProfile};
use crate::error::GatewayError;

fn storage(e: sqlx::Error) -> GatewayError {
    GatewayError::Storage(e.to_string())
}

impl SqlitePersistence {
    /// Loads the profile of a wallet.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn find_user(&self, wallet_address: &str) -> Result<Option<UserProfile>, GatewayError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT wallet_address, username, email, avatar_url, created_at, updated_at \
             FROM users WHERE wallet_address = ?1",
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(UserProfile::from))
    }

    /// Creates the profile or updates its mutable fields.
    ///
    /// `None` fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn upsert_user(
        &self,
        wallet_address: &str,
        username: Option<&str>,
        email: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<UserProfile, GatewayError> {
        let now = format_timestamp(storage_now());
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (wallet_address, username, email, avatar_url, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT(wallet_address) DO UPDATE SET \
                 username = COALESCE(excluded.username, users.username), \
                 email = COALESCE(excluded.email, users.email), \
                 avatar_url = COALESCE(excluded.avatar_url, users.avatar_url), \
                 updated_at = excluded.updated_at \
             RETURNING wallet_address, username, email, avatar_url, created_at, updated_at",
        )
        .bind(wallet_address)
        .bind(username)
        .bind(email)
        .bind(avatar_url)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        Ok(UserProfile::from(row))
    }

    /// Lists a wallet's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn list_transactions(
        &self,
        wallet_address: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT id, wallet_address, type, amount, symbol, timestamp, status, tx_hash \
             FROM transactions WHERE wallet_address = ?1 \
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
        )
        .bind(wallet_address)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    /// Appends a transaction record.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn insert_transaction(&self, tx: NewTransaction) -> Result<Transaction, GatewayError> {
        let timestamp = tx.timestamp.unwrap_or_else(storage_now);
        let status = tx.status.unwrap_or_else(|| "completed".to_string());
        let result = sqlx::query(
            "INSERT INTO transactions (wallet_address, type, amount, symbol, timestamp, status, tx_hash) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&tx.wallet_address)
        .bind(&tx.tx_type)
        .bind(tx.amount)
        .bind(tx.symbol.as_deref())
        .bind(format_timestamp(timestamp))
        .bind(&status)
        .bind(tx.tx_hash.as_deref())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(Transaction {
            id: result.last_insert_rowid(),
            wallet_address: tx.wallet_address,
            tx_type: tx.tx_type,
            amount: tx.amount,
            symbol: tx.symbol,
            timestamp,
            status,
            tx_hash: tx.tx_hash,
        })
    }
}
