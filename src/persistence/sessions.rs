//! Session and message queries.

use chrono::{DateTime, Utc};

use super::models::{MessageRow, SessionRow, format_timestamp};
use super::sqlite::SqlitePersistence;
use crate::domain::{Message, Session, SessionId};
use crate::error::GatewayError;

fn storage(e: sqlx::Error) -> GatewayError {
    GatewayError::Storage(e.to_string())
}

impl SqlitePersistence {
    /// Inserts a new session row.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn insert_session(
        &self,
        id: &SessionId,
        created_at: DateTime<Utc>,
        metadata: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let ts = format_timestamp(created_at);
        sqlx::query(
            "INSERT INTO sessions (id, created_at, updated_at, metadata) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id.as_str())
        .bind(&ts)
        .bind(&ts)
        .bind(metadata.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    /// Loads a session by ID.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn find_session(&self, id: &SessionId) -> Result<Option<Session>, GatewayError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, created_at, updated_at, metadata FROM sessions WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(Session::from))
    }

    /// Deletes a session together with its messages.
    ///
    /// Messages are removed explicitly as well as through the foreign-key
    /// cascade, so files created without `ON DELETE CASCADE` behave the same.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn delete_session(&self, id: &SessionId) -> Result<bool, GatewayError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        sqlx::query("DELETE FROM messages WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    /// Touches the session's `updated_at` and inserts the message in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if the session does not
    /// exist (nothing is written), or [`GatewayError::Storage`] on database
    /// failure.
    pub async fn append_message(&self, message: &Message) -> Result<(), GatewayError> {
        let ts = format_timestamp(message.created_at);
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let touched = sqlx::query("UPDATE sessions SET updated_at = ?1 WHERE id = ?2")
            .bind(&ts)
            .bind(message.session_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        if touched.rows_affected() == 0 {
            tx.rollback().await.map_err(storage)?;
            return Err(GatewayError::SessionNotFound(message.session_id.to_string()));
        }

        sqlx::query(
            "INSERT INTO messages (id, session_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(message.session_id.as_str())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&ts)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    /// Lists a session's messages, oldest first. Ties on `created_at` keep
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, GatewayError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, session_id, role, content, created_at FROM messages \
             WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}
