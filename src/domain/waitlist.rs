//! Waitlist entries and their approval status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Approval state of a waitlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    /// Awaiting review. Every entry starts here.
    #[default]
    Pending,
    /// Access granted.
    Approved,
    /// Access denied.
    Rejected,
}

impl WaitlistStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitlistStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(GatewayError::InvalidRequest(format!(
                "invalid status '{other}': must be one of pending, approved, rejected"
            ))),
        }
    }
}

/// One registration on the pre-launch waitlist.
#[derive(Debug, Clone, Serialize)]
pub struct WaitlistEntry {
    /// Row ID.
    pub id: i64,
    /// Wallet address; unique across the waitlist.
    pub wallet_address: String,
    /// Applicant name.
    pub name: String,
    /// Applicant email.
    pub email: String,
    /// Optional free-text motivation.
    pub reason: Option<String>,
    /// Approval status.
    pub status: WaitlistStatus,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_status_set() {
        assert_eq!("pending".parse::<WaitlistStatus>().ok(), Some(WaitlistStatus::Pending));
        assert_eq!("Approved".parse::<WaitlistStatus>().ok(), Some(WaitlistStatus::Approved));
        assert_eq!(" rejected ".parse::<WaitlistStatus>().ok(), Some(WaitlistStatus::Rejected));
    }

    #[test]
    fn rejects_values_outside_the_enum() {
        for raw in ["", "banned", "approve", "PENDING!"] {
            let Err(GatewayError::InvalidRequest(_)) = raw.parse::<WaitlistStatus>() else {
                panic!("'{raw}' should be rejected");
            };
        }
    }

    #[test]
    fn default_is_pending() {
        assert_eq!(WaitlistStatus::default(), WaitlistStatus::Pending);
    }
}
