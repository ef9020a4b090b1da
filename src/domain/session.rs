//! Chat sessions and the messages they group.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SessionId;

/// Author of a stored chat message.
///
/// The store is two-valued: human-authored or AI-authored. Legacy role
/// names (`bot`, `agent`) read back as [`Role::Assistant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user.
    User,
    /// Reply produced by the agent.
    Assistant,
}

impl Role {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Reads a stored role. Anything that is not `user` is AI-authored.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Assistant
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted conversation context.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Session key.
    pub id: SessionId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every appended message.
    pub updated_at: DateTime<Utc>,
    /// Free-form metadata, e.g. `{ "createdAt": ..., "userAgent": ... }`.
    pub metadata: serde_json::Value,
}

/// A single immutable chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message key (UUID v4).
    pub id: String,
    /// Owning session.
    pub session_id: SessionId,
    /// Author.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Creation timestamp; messages are ordered by it.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_role_names_are_ai_authored() {
        assert_eq!(Role::from_stored("user"), Role::User);
        assert_eq!(Role::from_stored("USER"), Role::User);
        assert_eq!(Role::from_stored("assistant"), Role::Assistant);
        assert_eq!(Role::from_stored("bot"), Role::Assistant);
        assert_eq!(Role::from_stored("agent"), Role::Assistant);
    }

    #[test]
    fn role_round_trips_through_storage_name() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(Role::from_stored(role.as_str()), role);
        }
    }
}
