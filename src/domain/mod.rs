//! Domain layer: identifiers, records, access rules and the event bus.
//!
//! This module holds the server-side model: profiles with roles, events
//! owned by organizers, tickets linking participants to events, the
//! access guard deciding who may see which view, and the bus that
//! broadcasts mutations.

pub mod access;
pub mod domain_event;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod profile;
pub mod ticket;

pub use access::{AccessDecision, AccessGuard, SessionState};
pub use domain_event::DomainEvent;
pub use event::{Event, EventDetails};
pub use event_bus::EventBus;
pub use ids::{EventId, TicketId, UserId};
pub use profile::{Profile, Role};
pub use ticket::{Ticket, TicketStatus};
