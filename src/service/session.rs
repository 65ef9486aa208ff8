//! Application-wide session context.
//!
//! [`SessionContext`] combines the identity provider with the profile
//! store. It listens for identity changes in a background task, fetches
//! the profile of every identity that signs in, and answers "what is the
//! state of this caller?" for the access guard.
//!
//! The listener has an explicit lifecycle: [`SessionContext::start`]
//! subscribes, [`SessionContext::shutdown`] unsubscribes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::domain::{Profile, SessionState, UserId};
use crate::identity::{IdentityChange, IdentityProvider};
use crate::persistence::ProfileStore;

/// Profile resolution state of one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProfileSlot {
    /// Fetch in flight.
    Pending,
    /// Fetched, no profile record.
    Missing,
    /// Fetched.
    Found(Profile),
}

/// Profile cache shared between the context and its listener task.
#[derive(Debug, Clone)]
struct ProfileCache {
    profiles: Arc<dyn ProfileStore>,
    slots: Arc<RwLock<HashMap<UserId, ProfileSlot>>>,
}

impl ProfileCache {
    /// Fetches the profile of `user_id` into the cache.
    ///
    /// Unless `force` is set, an already found profile is kept as is. A
    /// found profile is never downgraded to missing. A failed fetch clears
    /// the slot so the next request retries.
    async fn resolve(&self, user_id: UserId, force: bool) {
        {
            let mut slots = self.slots.write().await;
            match slots.get(&user_id) {
                Some(ProfileSlot::Found(_)) if !force => return,
                Some(ProfileSlot::Found(_)) => {}
                _ => {
                    slots.insert(user_id, ProfileSlot::Pending);
                }
            }
        }

        let fetched = self.profiles.get(user_id).await;

        let mut slots = self.slots.write().await;
        match fetched {
            Ok(Some(profile)) => {
                slots.insert(user_id, ProfileSlot::Found(profile));
            }
            Ok(None) => {
                if !matches!(slots.get(&user_id), Some(ProfileSlot::Found(_))) {
                    slots.insert(user_id, ProfileSlot::Missing);
                }
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "profile fetch failed");
                if matches!(slots.get(&user_id), Some(ProfileSlot::Pending)) {
                    slots.remove(&user_id);
                }
            }
        }
    }

    async fn slot(&self, user_id: UserId) -> Option<ProfileSlot> {
        self.slots.read().await.get(&user_id).cloned()
    }
}

/// Explicit, application-wide auth and profile context.
#[derive(Debug)]
pub struct SessionContext {
    identity: Arc<dyn IdentityProvider>,
    cache: ProfileCache,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    /// Creates a context. Call [`SessionContext::start`] to begin
    /// following identity changes.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            identity,
            cache: ProfileCache {
                profiles,
                slots: Arc::new(RwLock::new(HashMap::new())),
            },
            listener: Mutex::new(None),
        }
    }

    /// Subscribes to identity changes. Calling it again while the
    /// listener runs is a no-op.
    pub async fn start(&self) {
        let mut listener = self.listener.lock().await;
        if listener.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let mut changes = self.identity.subscribe();
        let cache = self.cache.clone();
        *listener = Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(IdentityChange::SignedIn(identity)) => {
                        cache.resolve(identity.user_id, false).await;
                    }
                    Ok(IdentityChange::SignedOut { user_id }) => {
                        cache.slots.write().await.remove(&user_id);
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "session listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("session listener stopped");
        }));
        tracing::info!("session context started");
    }

    /// Stops the listener and forgets every cached profile.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }
        self.cache.slots.write().await.clear();
        tracing::info!("session context stopped");
    }

    /// Returns `true` while the listener task is alive.
    pub async fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Re-reads the profile of `user_id`, replacing any cached value.
    pub async fn refresh(&self, user_id: UserId) {
        self.cache.resolve(user_id, true).await;
    }

    /// Returns `true` while a profile fetch for `user_id` is in flight.
    pub async fn is_resolving(&self, user_id: UserId) -> bool {
        matches!(self.cache.slot(user_id).await, Some(ProfileSlot::Pending))
    }

    /// Resolves the session state behind an optional bearer token.
    ///
    /// An unknown or missing token is unauthenticated. A token whose
    /// profile is still being fetched, or whose fetch failed, is loading.
    pub async fn state_for(&self, token: Option<&str>) -> SessionState {
        let Some(token) = token else {
            return SessionState::Unauthenticated;
        };

        let identity = match self.identity.current(token).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return SessionState::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "identity lookup failed");
                return SessionState::Loading;
            }
        };

        let mut slot = self.cache.slot(identity.user_id).await;
        if slot.is_none() {
            self.cache.resolve(identity.user_id, false).await;
            slot = self.cache.slot(identity.user_id).await;
        }

        match slot {
            Some(ProfileSlot::Found(profile)) => SessionState::Authenticated {
                identity,
                profile: Some(profile),
            },
            Some(ProfileSlot::Missing) => SessionState::Authenticated {
                identity,
                profile: None,
            },
            Some(ProfileSlot::Pending) | None => SessionState::Loading,
        }
    }
}
