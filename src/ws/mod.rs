//! WebSocket layer: the organizer live feed.
//!
//! The endpoint at `/ws?token=<bearer>` accepts organizers only. After
//! upgrading, a client subscribes to some or all of its own events and
//! receives every [`crate::domain::DomainEvent`] published for them.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
