//! Domain layer: core types, per-session locking, and rate limiting.
//!
//! This module contains the server-side domain model: session identity,
//! sessions and messages, user profiles and transactions, waitlist entries,
//! the per-session lock registry, and the sliding-window limiter.

pub mod rate_limiter;
pub mod session;
pub mod session_id;
pub mod session_locks;
pub mod user;
pub mod waitlist;

pub use rate_limiter::SlidingWindowLimiter;
pub use session::{Message, Role, Session};
pub use session_id::SessionId;
pub use session_locks::SessionLocks;
pub use user::{NewTransaction, Transaction, UserProfile};
pub use waitlist::{WaitlistEntry, WaitlistStatus};
