//! Persistence layer: document stores for profiles, events and tickets.
//!
//! Each collection is reached through an `async-trait` port. Every query
//! is a simple equality filter; there are no range scans, cursors or
//! full-text lookups. Two backends implement the ports: in-memory maps
//! (default, used by tests) and PostgreSQL via `sqlx`.

pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::TixlyConfig;
use crate::domain::{Event, EventDetails, EventId, Profile, Ticket, TicketId, UserId};

pub use memory::{MemoryEventStore, MemoryProfileStore, MemoryTicketStore};
pub use postgres::PostgresStore;

/// Errors raised by any store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Update or delete of a record that does not exist.
    #[error("{collection} record not found: {id}")]
    NotFound {
        /// Collection name.
        collection: &'static str,
        /// Record key.
        id: String,
    },

    /// Insert of a record whose key is already taken.
    #[error("{collection} record already exists: {id}")]
    AlreadyExists {
        /// Collection name.
        collection: &'static str,
        /// Record key.
        id: String,
    },

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Backend failure (connection, query, migration).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result of a conditional ticket insert keyed on (participant, event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The ticket was written.
    Inserted(Ticket),
    /// A ticket for the same participant and event already existed.
    Conflict(Ticket),
}

/// `profiles` collection.
#[async_trait]
pub trait ProfileStore: Send + Sync + fmt::Debug {
    /// Fetches a profile by identity id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn get(&self, user_id: UserId) -> Result<Option<Profile>, StoreError>;

    /// Inserts a new profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the identity already has one.
    async fn insert(&self, profile: &Profile) -> Result<(), StoreError>;
}

/// `events` collection.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Fetches an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// Inserts a new event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] on an id collision.
    async fn insert(&self, event: &Event) -> Result<(), StoreError>;

    /// All events with `organizer_id == organizer_id`, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, StoreError>;

    /// All events with `is_published == is_published`, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn find_by_published(&self, is_published: bool) -> Result<Vec<Event>, StoreError>;

    /// Overwrites the editable fields, leaving owner and flags untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    async fn update_details(&self, id: EventId, details: &EventDetails)
    -> Result<Event, StoreError>;

    /// Sets the single `is_published` field.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    async fn set_published(&self, id: EventId, is_published: bool) -> Result<(), StoreError>;

    /// Hard-deletes the event. Tickets are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    async fn delete(&self, id: EventId) -> Result<(), StoreError>;
}

/// `tickets` collection.
#[async_trait]
pub trait TicketStore: Send + Sync + fmt::Debug {
    /// Fetches a ticket by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;

    /// Compound equality query on (participant, event).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn find_by_participant_and_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Ticket>, StoreError>;

    /// All tickets held by a participant, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn find_by_participant(&self, user_id: UserId) -> Result<Vec<Ticket>, StoreError>;

    /// All tickets for an event, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Ticket>, StoreError>;

    /// Ticket whose scan code equals `code`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn find_by_code(&self, code: &str) -> Result<Option<Ticket>, StoreError>;

    /// Unconditional insert. Does not enforce one ticket per
    /// (participant, event).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on an id collision or backend failure.
    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError>;

    /// Atomic conditional insert: writes the ticket only if the
    /// participant holds no ticket for the event yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    async fn insert_unique(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError>;

    /// Sets the single `code` field.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the ticket does not exist.
    async fn set_code(&self, id: TicketId, code: &str) -> Result<(), StoreError>;
}

/// The three collections the application talks to.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Profile collection.
    pub profiles: Arc<dyn ProfileStore>,
    /// Event collection.
    pub events: Arc<dyn EventStore>,
    /// Ticket collection.
    pub tickets: Arc<dyn TicketStore>,
    /// Connection pool behind the collections, when they are persistent.
    pub pool: Option<PgPool>,
}

impl Stores {
    /// In-memory stores, empty.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            profiles: Arc::new(MemoryProfileStore::new()),
            events: Arc::new(MemoryEventStore::new()),
            tickets: Arc::new(MemoryTicketStore::new()),
            pool: None,
        }
    }

    /// PostgreSQL-backed stores sharing one connection pool.
    #[must_use]
    pub fn postgres(store: PostgresStore) -> Self {
        let pool = store.pool().clone();
        let store = Arc::new(store);
        Self {
            profiles: Arc::clone(&store) as Arc<dyn ProfileStore>,
            events: Arc::clone(&store) as Arc<dyn EventStore>,
            tickets: store,
            pool: Some(pool),
        }
    }

    /// Builds the stores selected by the configuration.
    ///
    /// With persistence disabled this returns empty in-memory stores.
    /// Otherwise it connects to PostgreSQL and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database is unreachable or a
    /// migration fails.
    pub async fn from_config(config: &TixlyConfig) -> Result<Self, StoreError> {
        if !config.persistence_enabled {
            tracing::info!("persistence disabled, using in-memory stores");
            return Ok(Self::in_memory());
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let store = PostgresStore::new(pool);
        store.migrate().await?;
        tracing::info!("connected to PostgreSQL");
        Ok(Self::postgres(store))
    }
}
