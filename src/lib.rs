//! # tixly
//!
//! Event ticketing service. Organizers create events as drafts, publish
//! them and watch registrations arrive; participants browse published
//! events, register and receive a QR-coded ticket whose code is the
//! ticket's own id. Organizers list attendees and scan tickets at the
//! door.
//!
//! Authentication and storage sit behind traits: an
//! [`identity::IdentityProvider`] and the document stores of
//! [`persistence`]. In-memory implementations of both ship with the
//! crate, plus PostgreSQL stores.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers + access guard (api/)
//!     ├── Organizer feed (ws/)
//!     │
//!     ├── Auth / Event / Registration / Ticket services (service/)
//!     ├── SessionContext (service/session)
//!     ├── EventBus (domain/)
//!     │
//!     ├── IdentityProvider (identity/)
//!     ├── QR rendering (render)
//!     │
//!     └── Profile / Event / Ticket stores (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod render;
pub mod server;
pub mod service;
pub mod ws;
