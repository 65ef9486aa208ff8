//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers are exposed as plain UUIDs and dates as `YYYY-MM-DD`.

pub mod auth_dto;
pub mod common_dto;
pub mod event_dto;
pub mod ticket_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use event_dto::*;
pub use ticket_dto::*;
