//! In-process identity provider.
//!
//! Accounts and sessions live in maps and are lost on restart. Expired
//! sessions are evicted whenever a new session is opened.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, broadcast};

use super::credentials::{
    generate_token, hash_password, hash_token, session_expiry, verify_password,
};
use super::{
    AuthError, CHANGE_CHANNEL_CAPACITY, Identity, IdentityChange, IdentityProvider,
    IssuedSession, MIN_PASSWORD_LEN, normalize_email,
};
use crate::domain::UserId;

#[derive(Debug)]
struct Account {
    user_id: UserId,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct LiveSession {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

/// Identity provider keeping accounts and sessions in memory.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    /// Accounts keyed by normalised email.
    accounts: RwLock<HashMap<String, Account>>,
    /// Live sessions keyed by token digest.
    sessions: RwLock<HashMap<String, LiveSession>>,
    changes: broadcast::Sender<IdentityChange>,
    session_ttl: Duration,
}

impl InMemoryIdentityProvider {
    /// Creates an empty provider whose sessions live for `session_ttl`.
    #[must_use]
    pub fn new(session_ttl: Duration) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            changes,
            session_ttl,
        }
    }

    /// Returns the number of stored sessions, including expired ones not
    /// evicted yet.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evicts every session that expired by now and announces a sign-out
    /// for each affected identity. Returns the number of sessions removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut signed_out = BTreeSet::new();
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| {
                let live = s.expires_at > now;
                if !live {
                    signed_out.insert(s.identity.user_id);
                }
                live
            });
            before - sessions.len()
        };

        for user_id in signed_out {
            let _ = self.changes.send(IdentityChange::SignedOut { user_id });
        }
        if removed > 0 {
            tracing::debug!(removed, "expired sessions evicted");
        }
        removed
    }

    async fn open_session(&self, identity: Identity) -> Result<IssuedSession, AuthError> {
        let expires_at = session_expiry(Utc::now(), self.session_ttl)?;
        self.purge_expired().await;

        let token = generate_token();
        self.sessions.write().await.insert(
            hash_token(&token),
            LiveSession {
                identity: identity.clone(),
                expires_at,
            },
        );
        let _ = self.changes.send(IdentityChange::SignedIn(identity.clone()));
        Ok(IssuedSession {
            identity,
            token,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let password_hash = hash_password(password)?;

        let user_id = UserId::new();
        {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            accounts.insert(
                email.clone(),
                Account {
                    user_id,
                    password_hash,
                },
            );
        }

        tracing::info!(%user_id, "account created");
        self.open_session(Identity { user_id, email }).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredential)?;
        let user_id = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(&email).ok_or(AuthError::InvalidCredential)?;
            if !verify_password(password, &account.password_hash) {
                return Err(AuthError::InvalidCredential);
            }
            account.user_id
        };

        tracing::debug!(%user_id, "session opened");
        self.open_session(Identity { user_id, email }).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let removed = self.sessions.write().await.remove(&hash_token(token));
        if let Some(session) = removed {
            tracing::debug!(user_id = %session.identity.user_id, "session closed");
            let _ = self.changes.send(IdentityChange::SignedOut {
                user_id: session.identity.user_id,
            });
        }
        Ok(())
    }

    async fn current(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let digest = hash_token(token);
        let session = self.sessions.read().await.get(&digest).cloned();
        match session {
            Some(s) if s.expires_at > Utc::now() => Ok(Some(s.identity)),
            Some(s) => {
                self.sessions.write().await.remove(&digest);
                let _ = self.changes.send(IdentityChange::SignedOut {
                    user_id: s.identity.user_id,
                });
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn provider() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::new(Duration::hours(1))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let idp = provider();
        let Ok(created) = idp.sign_up("Ani@Example.com", "rahasia123").await else {
            panic!("sign up failed");
        };
        assert_eq!(created.identity.email, "ani@example.com");

        let Ok(session) = idp.sign_in("ani@example.com", "rahasia123").await else {
            panic!("sign in failed");
        };
        assert_eq!(session.identity.user_id, created.identity.user_id);
        assert_ne!(session.token, created.token);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let idp = provider();
        let _ = idp.sign_up("ani@example.com", "rahasia123").await;
        let result = idp.sign_up("ANI@example.com", "another-pass").await;
        assert_eq!(result.err(), Some(AuthError::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn short_password_is_weak() {
        let result = provider().sign_up("ani@example.com", "12345").await;
        assert_eq!(result.err(), Some(AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let idp = provider();
        let _ = idp.sign_up("ani@example.com", "rahasia123").await;
        let wrong = idp.sign_in("ani@example.com", "nope-nope").await.err();
        let unknown = idp.sign_in("budi@example.com", "rahasia123").await.err();
        assert_eq!(wrong, Some(AuthError::InvalidCredential));
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn token_resolves_until_sign_out() {
        let idp = provider();
        let Ok(session) = idp.sign_up("ani@example.com", "rahasia123").await else {
            panic!("sign up failed");
        };
        let current = idp.current(&session.token).await.ok().flatten();
        assert_eq!(current, Some(session.identity.clone()));

        assert!(idp.sign_out(&session.token).await.is_ok());
        assert_eq!(idp.current(&session.token).await.ok().flatten(), None);
        assert_eq!(idp.session_count().await, 0);
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let idp = InMemoryIdentityProvider::new(Duration::seconds(-1));
        let Ok(session) = idp.sign_up("ani@example.com", "rahasia123").await else {
            panic!("sign up failed");
        };
        assert_eq!(idp.current(&session.token).await.ok().flatten(), None);
    }

    #[tokio::test]
    async fn changes_are_broadcast() {
        let idp = provider();
        let mut rx = idp.subscribe();
        let Ok(session) = idp.sign_up("ani@example.com", "rahasia123").await else {
            panic!("sign up failed");
        };
        let _ = idp.sign_out(&session.token).await;

        let Ok(IdentityChange::SignedIn(identity)) = rx.recv().await else {
            panic!("expected sign-in change");
        };
        assert_eq!(identity.user_id, session.identity.user_id);
        let Ok(IdentityChange::SignedOut { user_id }) = rx.recv().await else {
            panic!("expected sign-out change");
        };
        assert_eq!(user_id, session.identity.user_id);
    }

    #[tokio::test]
    async fn opening_a_session_evicts_expired_ones() {
        let idp = InMemoryIdentityProvider::new(Duration::milliseconds(1));
        let _ = idp.sign_up("ani@example.com", "rahasia123").await;
        for _ in 0..3 {
            let _ = idp.sign_in("ani@example.com", "rahasia123").await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let mut rx = idp.subscribe();
        let Ok(session) = idp.sign_in("ani@example.com", "rahasia123").await else {
            panic!("sign in failed");
        };
        assert_eq!(idp.session_count().await, 1);
        let Ok(IdentityChange::SignedOut { user_id }) = rx.recv().await else {
            panic!("expected one sign-out for the evicted sessions");
        };
        assert_eq!(user_id, session.identity.user_id);
        assert!(matches!(rx.recv().await, Ok(IdentityChange::SignedIn(_))));
    }

    #[tokio::test]
    async fn purge_keeps_live_sessions() {
        let idp = provider();
        let _ = idp.sign_up("ani@example.com", "rahasia123").await;
        let _ = idp.sign_in("ani@example.com", "rahasia123").await;
        assert_eq!(idp.purge_expired().await, 0);
        assert_eq!(idp.session_count().await, 2);
    }

    #[tokio::test]
    async fn unrepresentable_lifetime_fails_instead_of_panicking() {
        let Some(ttl) = Duration::try_hours(10_000_000_000) else {
            panic!("ttl should be representable");
        };
        let idp = InMemoryIdentityProvider::new(ttl);
        let result = idp.sign_up("ani@example.com", "rahasia123").await;
        assert!(matches!(result, Err(AuthError::Unavailable(_))));
        assert_eq!(idp.session_count().await, 0);
    }
}
