//! Identity provider: email/password accounts and bearer sessions.
//!
//! The identity service authenticates a visitor and yields a stable
//! [`UserId`]. It knows nothing about roles or profiles; those live in
//! the profile store. Every sign-in and sign-out is announced on a
//! broadcast channel so that the [`crate::service::SessionContext`] can
//! keep its profile cache in step.

pub(crate) mod credentials;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::UserId;

pub use memory::InMemoryIdentityProvider;
pub use postgres::PostgresIdentityProvider;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Stable identity id.
    pub user_id: UserId,
    /// Normalised (lower-case) email.
    pub email: String,
}

/// A freshly issued bearer session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Identity the session belongs to.
    pub identity: Identity,
    /// Opaque bearer token. Only its hash is kept server-side.
    pub token: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Change notification emitted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    /// A session was opened for this identity (sign-up or sign-in).
    SignedIn(Identity),
    /// A session of this identity was closed.
    SignedOut {
        /// Identity whose session ended.
        user_id: UserId,
    },
}

/// Which identity operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Creating an account.
    SignUp,
    /// Opening a session.
    SignIn,
}

/// Errors raised by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("auth/invalid-credential")]
    InvalidCredential,
    /// Sign-up with an email that already has an account.
    #[error("auth/email-already-in-use")]
    EmailAlreadyInUse,
    /// Password shorter than [`MIN_PASSWORD_LEN`].
    #[error("auth/weak-password")]
    WeakPassword,
    /// Malformed email address.
    #[error("auth/invalid-email")]
    InvalidEmail,
    /// The identity service failed.
    #[error("auth/unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Fixed user-facing message for this error during `action`.
    ///
    /// Known codes get a specific message; everything else collapses to
    /// the action's generic retry message.
    #[must_use]
    pub const fn user_message(&self, action: AuthAction) -> &'static str {
        match (action, self) {
            (AuthAction::SignIn, Self::InvalidCredential) => "Incorrect email or password.",
            (AuthAction::SignIn, _) => "Failed to sign in. Please try again.",
            (AuthAction::SignUp, Self::EmailAlreadyInUse) => "This email is already registered.",
            (AuthAction::SignUp, Self::WeakPassword) => "Password must be at least 6 characters.",
            (AuthAction::SignUp, Self::InvalidEmail) => "Please enter a valid email address.",
            (AuthAction::SignUp, _) => "Failed to register. Please try again.",
        }
    }
}

/// External identity service contract.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Creates an account and opens a session for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailAlreadyInUse`], [`AuthError::WeakPassword`]
    /// or [`AuthError::InvalidEmail`] on rejected input.
    async fn sign_up(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError>;

    /// Opens a session for an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] for an unknown email or a
    /// wrong password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError>;

    /// Closes the session behind `token`. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unavailable`] if the service fails.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Resolves a bearer token to its identity, if the session is live.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unavailable`] if the service fails.
    async fn current(&self, token: &str) -> Result<Option<Identity>, AuthError>;

    /// Subscribes to identity changes from now on.
    fn subscribe(&self) -> broadcast::Receiver<IdentityChange>;
}

/// Lower-cases and trims an email, rejecting obviously malformed input.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEmail`] if the address has no local part
/// or no domain.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_lowercases() {
        assert_eq!(
            normalize_email("  Ani@Example.COM ").ok().as_deref(),
            Some("ani@example.com")
        );
    }

    #[test]
    fn normalize_email_rejects_missing_parts() {
        for bad in ["", "ani", "@example.com", "ani@"] {
            assert_eq!(normalize_email(bad), Err(AuthError::InvalidEmail));
        }
    }

    #[test]
    fn unknown_errors_collapse_to_generic_message() {
        let err = AuthError::Unavailable("boom".to_string());
        assert_eq!(
            err.user_message(AuthAction::SignUp),
            "Failed to register. Please try again."
        );
        assert_eq!(
            AuthError::EmailAlreadyInUse.user_message(AuthAction::SignIn),
            "Failed to sign in. Please try again."
        );
    }

    #[test]
    fn known_errors_have_fixed_messages() {
        assert_eq!(
            AuthError::InvalidCredential.user_message(AuthAction::SignIn),
            "Incorrect email or password."
        );
        assert_eq!(
            AuthError::EmailAlreadyInUse.user_message(AuthAction::SignUp),
            "This email is already registered."
        );
    }
}
