//! User profiles and their transaction log.

use crate::domain::{NewTransaction, Transaction, UserProfile};
use crate::error::GatewayError;
use crate::persistence::SqlitePersistence;

/// Default number of transactions returned.
pub const DEFAULT_TRANSACTION_LIMIT: i64 = 20;
/// Upper bound on transactions returned.
pub const MAX_TRANSACTION_LIMIT: i64 = 100;

/// Profile upserts and the append-only transaction log.
#[derive(Debug)]
pub struct UserService {
    store: SqlitePersistence,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub const fn new(store: SqlitePersistence) -> Self {
        Self { store }
    }

    /// Loads a profile. `None` when the wallet has never posted one.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn get_profile(&self, wallet_address: &str) -> Result<Option<UserProfile>, GatewayError> {
        self.store.find_user(wallet_address).await
    }

    /// Creates or updates a profile. Omitted fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn upsert_profile(
        &self,
        wallet_address: &str,
        username: Option<&str>,
        email: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<UserProfile, GatewayError> {
        let profile = self
            .store
            .upsert_user(wallet_address, username, email, avatar_url)
            .await?;
        tracing::info!(wallet_address, "profile saved");
        Ok(profile)
    }

    /// Lists a wallet's transactions, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_TRANSACTION_LIMIT`] and is clamped to
    /// `1..=MAX_TRANSACTION_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn list_transactions(
        &self,
        wallet_address: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let limit = limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT);
        self.store.list_transactions(wallet_address, limit).await
    }

    /// Records a transaction. Status defaults to `completed`, timestamp to now.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the amount is not finite.
    /// - [`GatewayError::Storage`] on database failure.
    pub async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction, GatewayError> {
        if !tx.amount.is_finite() {
            return Err(GatewayError::InvalidRequest(
                "amount must be a finite number".to_string(),
            ));
        }
        let stored = self.store.insert_transaction(tx).await?;
        tracing::info!(
            wallet_address = %stored.wallet_address,
            id = stored.id,
            tx_type = %stored.tx_type,
            "transaction recorded"
        );
        Ok(stored)
    }
}
