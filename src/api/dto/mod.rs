//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire. Request fields are optional at
//! the serde level so that a missing field yields a 400 naming it rather
//! than a generic deserialization error.

pub mod agent_dto;
pub mod common_dto;
pub mod user_dto;
pub mod waitlist_dto;

pub use agent_dto::*;
pub use common_dto::*;
pub use user_dto::*;
pub use waitlist_dto::*;
