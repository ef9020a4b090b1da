//! Type-safe chat session identifier.
//!
//! [`SessionId`] is a newtype around the opaque string key of the
//! `sessions` table, so session keys cannot be confused with message IDs
//! or wallet addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a chat session.
///
/// Freshly generated IDs are UUID v4 strings. IDs supplied by clients are
/// kept verbatim; the store decides whether they exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random `SessionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_uuid_format() {
        let id = SessionId::new();
        let s = format!("{id}");
        assert_eq!(s.len(), 36);
        assert!(uuid::Uuid::parse_str(&s).is_ok());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = SessionId::from("abc123");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"abc123\"");
    }

    #[test]
    fn client_supplied_ids_are_kept_verbatim() {
        let id = SessionId::from("session_1712345678_x9");
        assert_eq!(id.as_str(), "session_1712345678_x9");
    }
}
