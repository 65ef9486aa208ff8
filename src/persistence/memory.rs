//! In-memory document stores.
//!
//! Each collection is a `RwLock<HashMap<..>>`. Conditional writes run
//! under the write lock, so they are atomic with respect to every other
//! operation on the same collection.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventStore, InsertOutcome, ProfileStore, StoreError, TicketStore};
use crate::domain::{Event, EventDetails, EventId, Profile, Ticket, TicketId, UserId};

/// Keyed document map shared by the in-memory stores.
#[derive(Debug)]
struct Collection<K, V> {
    name: &'static str,
    docs: RwLock<HashMap<K, V>>,
}

impl<K, V> Collection<K, V>
where
    K: Eq + Hash + Copy + std::fmt::Display,
    V: Clone,
{
    fn new(name: &'static str) -> Self {
        Self {
            name,
            docs: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, key: K) -> Option<V> {
        self.docs.read().await.get(&key).cloned()
    }

    async fn insert_new(&self, key: K, doc: V) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                collection: self.name,
                id: key.to_string(),
            });
        }
        docs.insert(key, doc);
        Ok(())
    }

    async fn filter(&self, pred: impl Fn(&V) -> bool) -> Vec<V> {
        self.docs
            .read()
            .await
            .values()
            .filter(|doc| pred(doc))
            .cloned()
            .collect()
    }

    async fn find(&self, pred: impl Fn(&V) -> bool) -> Option<V> {
        self.docs
            .read()
            .await
            .values()
            .find(|doc| pred(doc))
            .cloned()
    }

    async fn update(&self, key: K, apply: impl FnOnce(&mut V)) -> Result<V, StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            collection: self.name,
            id: key.to_string(),
        })?;
        apply(doc);
        Ok(doc.clone())
    }

    async fn remove(&self, key: K) -> Result<V, StoreError> {
        self.docs
            .write()
            .await
            .remove(&key)
            .ok_or_else(|| StoreError::NotFound {
                collection: self.name,
                id: key.to_string(),
            })
    }

    async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

/// In-memory `profiles` collection.
#[derive(Debug)]
pub struct MemoryProfileStore {
    profiles: Collection<UserId, Profile>,
}

impl MemoryProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: Collection::new("profiles"),
        }
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.get(user_id).await)
    }

    async fn insert(&self, profile: &Profile) -> Result<(), StoreError> {
        self.profiles
            .insert_new(profile.user_id, profile.clone())
            .await
    }
}

/// In-memory `events` collection.
#[derive(Debug)]
pub struct MemoryEventStore {
    events: Collection<EventId, Event>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Collection::new("events"),
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.events.get(id).await)
    }

    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        self.events.insert_new(event.id, event.clone()).await
    }

    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .events
            .filter(|e| e.organizer_id == organizer_id)
            .await)
    }

    async fn find_by_published(&self, is_published: bool) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .events
            .filter(|e| e.is_published == is_published)
            .await)
    }

    async fn update_details(
        &self,
        id: EventId,
        details: &EventDetails,
    ) -> Result<Event, StoreError> {
        self.events
            .update(id, |e| e.details = details.clone())
            .await
    }

    async fn set_published(&self, id: EventId, is_published: bool) -> Result<(), StoreError> {
        self.events
            .update(id, |e| e.is_published = is_published)
            .await
            .map(|_| ())
    }

    async fn delete(&self, id: EventId) -> Result<(), StoreError> {
        self.events.remove(id).await.map(|_| ())
    }
}

/// In-memory `tickets` collection.
#[derive(Debug)]
pub struct MemoryTicketStore {
    tickets: Collection<TicketId, Ticket>,
}

impl MemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tickets: Collection::new("tickets"),
        }
    }

    /// Number of stored tickets.
    pub async fn len(&self) -> usize {
        self.tickets.len().await
    }

    /// Returns `true` if no ticket is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.get(id).await)
    }

    async fn find_by_participant_and_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .tickets
            .find(|t| t.user_id == user_id && t.event_id == event_id)
            .await)
    }

    async fn find_by_participant(&self, user_id: UserId) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.tickets.filter(|t| t.user_id == user_id).await)
    }

    async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.tickets.filter(|t| t.event_id == event_id).await)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Ticket>, StoreError> {
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self.tickets.find(|t| t.code == code).await)
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.tickets.insert_new(ticket.id, ticket.clone()).await
    }

    async fn insert_unique(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        let mut docs = self.tickets.docs.write().await;
        if let Some(existing) = docs
            .values()
            .find(|t| t.user_id == ticket.user_id && t.event_id == ticket.event_id)
        {
            return Ok(InsertOutcome::Conflict(existing.clone()));
        }
        if docs.contains_key(&ticket.id) {
            return Err(StoreError::AlreadyExists {
                collection: self.tickets.name,
                id: ticket.id.to_string(),
            });
        }
        docs.insert(ticket.id, ticket.clone());
        Ok(InsertOutcome::Inserted(ticket.clone()))
    }

    async fn set_code(&self, id: TicketId, code: &str) -> Result<(), StoreError> {
        self.tickets
            .update(id, |t| t.code = code.to_string())
            .await
            .map(|_| ())
    }
}
