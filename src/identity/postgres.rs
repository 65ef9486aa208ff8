//! PostgreSQL-backed identity provider.
//!
//! Accounts and sessions live in the `accounts` and `sessions` tables, so
//! sign-ins survive a restart. Change notifications are only broadcast to
//! listeners in this process.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::credentials::{
    generate_token, hash_password, hash_token, session_expiry, verify_password,
};
use super::{
    AuthError, CHANGE_CHANNEL_CAPACITY, Identity, IdentityChange, IdentityProvider,
    IssuedSession, MIN_PASSWORD_LEN, normalize_email,
};
use crate::domain::UserId;

/// Identity provider storing accounts and sessions in PostgreSQL.
#[derive(Debug)]
pub struct PostgresIdentityProvider {
    pool: PgPool,
    changes: broadcast::Sender<IdentityChange>,
    session_ttl: Duration,
}

fn unavailable(e: sqlx::Error) -> AuthError {
    AuthError::Unavailable(e.to_string())
}

impl PostgresIdentityProvider {
    /// Creates a provider over `pool` whose sessions live for
    /// `session_ttl`. The tables must already be migrated.
    #[must_use]
    pub fn new(pool: PgPool, session_ttl: Duration) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            pool,
            changes,
            session_ttl,
        }
    }

    /// Deletes every expired session and announces a sign-out for each
    /// affected identity. Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unavailable`] on a database failure.
    pub async fn purge_expired(&self) -> Result<usize, AuthError> {
        let removed: Vec<Uuid> =
            sqlx::query_scalar("DELETE FROM sessions WHERE expires_at <= NOW() RETURNING user_id")
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;

        let signed_out: BTreeSet<Uuid> = removed.iter().copied().collect();
        for user_id in signed_out {
            let _ = self.changes.send(IdentityChange::SignedOut {
                user_id: UserId::from_uuid(user_id),
            });
        }
        if !removed.is_empty() {
            tracing::debug!(removed = removed.len(), "expired sessions evicted");
        }
        Ok(removed.len())
    }

    async fn open_session(&self, identity: Identity) -> Result<IssuedSession, AuthError> {
        let expires_at = session_expiry(Utc::now(), self.session_ttl)?;
        self.purge_expired().await?;

        let token = generate_token();
        sqlx::query("INSERT INTO sessions (token_digest, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(hash_token(&token))
            .bind(*identity.user_id.as_uuid())
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        let _ = self.changes.send(IdentityChange::SignedIn(identity.clone()));
        Ok(IssuedSession {
            identity,
            token,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityProvider for PostgresIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let password_hash = hash_password(password)?;

        let user_id = UserId::new();
        let result = sqlx::query(
            "INSERT INTO accounts (user_id, email, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(*user_id.as_uuid())
        .bind(&email)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(AuthError::EmailAlreadyInUse);
        }

        tracing::info!(%user_id, "account created");
        self.open_session(Identity { user_id, email }).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredential)?;
        let (user_id, password_hash) = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT user_id, password_hash FROM accounts WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or(AuthError::InvalidCredential)?;
        if !verify_password(password, &password_hash) {
            return Err(AuthError::InvalidCredential);
        }

        let user_id = UserId::from_uuid(user_id);
        tracing::debug!(%user_id, "session opened");
        self.open_session(Identity { user_id, email }).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let removed: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM sessions WHERE token_digest = $1 RETURNING user_id")
                .bind(hash_token(token))
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;
        if let Some(user_id) = removed {
            let user_id = UserId::from_uuid(user_id);
            tracing::debug!(%user_id, "session closed");
            let _ = self.changes.send(IdentityChange::SignedOut { user_id });
        }
        Ok(())
    }

    async fn current(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let digest = hash_token(token);
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "SELECT s.user_id, a.email, s.expires_at FROM sessions s \
             JOIN accounts a ON a.user_id = s.user_id WHERE s.token_digest = $1",
        )
        .bind(&digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let Some((user_id, email, expires_at)) = row else {
            return Ok(None);
        };
        let user_id = UserId::from_uuid(user_id);
        if expires_at > Utc::now() {
            return Ok(Some(Identity { user_id, email }));
        }

        sqlx::query("DELETE FROM sessions WHERE token_digest = $1")
            .bind(&digest)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        let _ = self.changes.send(IdentityChange::SignedOut { user_id });
        Ok(None)
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityChange> {
        self.changes.subscribe()
    }
}
