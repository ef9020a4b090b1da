//! Service layer: business logic orchestration.
//!
//! Services return typed outcomes and [`crate::error::GatewayError`]s; they
//! never deal in HTTP status codes.

pub mod relay;
pub mod session_service;
pub mod user_service;
pub mod waitlist_service;

pub use relay::AgentRelay;
pub use session_service::SessionService;
pub use user_service::UserService;
pub use waitlist_service::{JoinRequest, WaitlistCheck, WaitlistService};

use crate::error::GatewayError;

/// Trims `value` and rejects it if missing or blank.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] naming `field`.
pub fn required(field: &str, value: Option<&str>) -> Result<String, GatewayError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::missing_field(field))
}
