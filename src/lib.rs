//! # cryptochat-gateway
//!
//! REST gateway for a crypto assistant chat: persisted chat sessions, a relay
//! that forwards messages to a reply backend, user profiles with a
//! transaction log, and a pre-launch waitlist.
//!
//! Replies come from one of two interchangeable backends selected by
//! configuration: a hosted OpenAI-compatible chat-completion API, or an
//! agent script run as a subprocess.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── Rate limiters (api/rate_limit)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── SessionService / AgentRelay / UserService / WaitlistService (service/)
//!     ├── ReplyBackend: hosted API | agent process (service/relay)
//!     │
//!     ├── SessionLocks, SlidingWindowLimiter (domain/)
//!     │
//!     └── SQLite Persistence (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
