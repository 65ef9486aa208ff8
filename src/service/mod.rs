//! Service layer: business logic orchestration.
//!
//! Services own `Arc` handles to the stores, enforce ownership rules,
//! and emit [`crate::domain::DomainEvent`]s through the
//! [`crate::domain::EventBus`]. [`SessionContext`] keeps the profile of
//! every signed-in identity at hand for the access guard.

pub mod auth_service;
pub mod event_service;
pub mod registration_service;
pub mod session;
pub mod ticket_service;

pub use auth_service::{AuthService, AuthSession};
pub use event_service::{Dashboard, EventService};
pub use registration_service::{RegistrationOutcome, RegistrationService};
pub use session::SessionContext;
pub use ticket_service::{QrExport, ScanResult, TicketService, TicketWithEvent};
