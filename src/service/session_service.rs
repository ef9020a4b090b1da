//! Session service: chat sessions and their message history.

use crate::domain::{Message, Role, Session, SessionId, SessionLocks};
use crate::error::GatewayError;
use crate::persistence::SqlitePersistence;
use crate::persistence::models::storage_now;

/// CRUD over sessions and messages.
///
/// "Not found" is a normal outcome here (`None`, `false`, empty list); only
/// database failures are errors. Appends to one session are serialized
/// through [`SessionLocks`].
#[derive(Debug)]
pub struct SessionService {
    store: SqlitePersistence,
    locks: SessionLocks,
}

impl SessionService {
    /// Creates a new `SessionService`.
    #[must_use]
    pub fn new(store: SqlitePersistence) -> Self {
        Self {
            store,
            locks: SessionLocks::new(),
        }
    }

    /// Creates a session with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn create_session(&self, metadata: serde_json::Value) -> Result<Session, GatewayError> {
        let id = SessionId::new();
        let now = storage_now();
        self.store.insert_session(&id, now, &metadata).await?;
        tracing::info!(session_id = %id, "session created");
        Ok(Session {
            id,
            created_at: now,
            updated_at: now,
            metadata,
        })
    }

    /// Fetches a session. `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, GatewayError> {
        self.store.find_session(id).await
    }

    /// Deletes a session and its messages. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn delete_session(&self, id: &SessionId) -> Result<bool, GatewayError> {
        let removed = {
            let _guard = self.locks.acquire(id).await;
            self.store.delete_session(id).await?
        };
        self.locks.remove(id).await;
        if removed {
            tracing::info!(session_id = %id, "session deleted");
        }
        Ok(removed)
    }

    /// Appends a message and refreshes the session's `updated_at` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if the session does not
    /// exist, or [`GatewayError::Storage`] on database failure.
    pub async fn add_message(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<Message, GatewayError> {
        let _guard = self.locks.acquire(session_id).await;
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.clone(),
            role,
            content: content.to_string(),
            created_at: storage_now(),
        };
        self.store.append_message(&message).await?;
        tracing::debug!(session_id = %session_id, %role, len = content.len(), "message appended");
        Ok(message)
    }

    /// Lists a session's messages, oldest first. Empty for unknown sessions.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] on database failure.
    pub async fn get_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, GatewayError> {
        self.store.list_messages(session_id).await
    }
}
