//! Waitlist queries.

use chrono::{DateTime, Utc};

use super::models::{WaitlistRow, format_timestamp};
use super::sqlite::SqlitePersistence;
use crate::domain::{WaitlistEntry, WaitlistStatus};
use crate::error::GatewayError;

const WAITLIST_COLUMNS: &str = "id, wallet_address, name, email, reason, status, created_at";

fn storage(e: sqlx::Error) -> GatewayError {
    GatewayError::Storage(e.to_string())
}

impl SqlitePersistence {
    /// Looks up the entry registered for a wallet.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn find_waitlist_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<Option<WaitlistEntry>, GatewayError> {
        let row = sqlx::query_as::<_, WaitlistRow>(&format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist WHERE wallet_address = ?1"
        ))
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(WaitlistEntry::from))
    }

    /// Looks up an entry by row ID.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn find_waitlist_by_id(&self, id: i64) -> Result<Option<WaitlistEntry>, GatewayError> {
        let row = sqlx::query_as::<_, WaitlistRow>(&format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(WaitlistEntry::from))
    }

    /// Inserts a pending entry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyRegistered`] when the wallet is
    /// already on the waitlist (unique index), or
    /// [`GatewayError::Storage`] on any other database failure.
    pub async fn insert_waitlist(
        &self,
        wallet_address: &str,
        name: &str,
        email: &str,
        reason: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<WaitlistEntry, GatewayError> {
        let result = sqlx::query(
            "INSERT INTO waitlist (wallet_address, name, email, reason, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(wallet_address)
        .bind(name)
        .bind(email)
        .bind(reason)
        .bind(WaitlistStatus::Pending.as_str())
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::from_sqlx(&e, Some(wallet_address)))?;

        Ok(WaitlistEntry {
            id: result.last_insert_rowid(),
            wallet_address: wallet_address.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            reason: reason.map(str::to_string),
            status: WaitlistStatus::Pending,
            created_at,
        })
    }

    /// Counts all entries regardless of status.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn count_waitlist(&self) -> Result<i64, GatewayError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM waitlist")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }

    /// Lists entries newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn list_waitlist(
        &self,
        limit: i64,
        offset: i64,
        status: Option<WaitlistStatus>,
    ) -> Result<Vec<WaitlistEntry>, GatewayError> {
        let rows = if let Some(status) = status {
            sqlx::query_as::<_, WaitlistRow>(&format!(
                "SELECT {WAITLIST_COLUMNS} FROM waitlist WHERE status = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            ))
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, WaitlistRow>(&format!(
                "SELECT {WAITLIST_COLUMNS} FROM waitlist \
                 ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(storage)?;

        Ok(rows.into_iter().map(WaitlistEntry::from).collect())
    }

    /// Sets the status of an entry. Returns `false` if no row has that ID.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn update_waitlist_status(
        &self,
        id: i64,
        status: WaitlistStatus,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query("UPDATE waitlist SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }
}
