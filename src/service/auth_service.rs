//! Authentication service: sign-up, sign-in, sign-out.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::SessionContext;
use crate::domain::{Profile, Role};
use crate::error::TixlyError;
use crate::identity::{AuthAction, AuthError, IdentityProvider};
use crate::persistence::ProfileStore;

/// Maximum length of a display name.
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Result of a successful sign-up or sign-in.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer token to send on subsequent requests.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Caller profile, if one exists.
    pub profile: Option<Profile>,
    /// Landing path for the caller's role.
    pub home_path: Option<&'static str>,
}

/// Orchestrates the identity provider and the profile store.
#[derive(Debug, Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    session: Arc<SessionContext>,
}

impl AuthService {
    /// Creates a new `AuthService`.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            identity,
            profiles,
            session,
        }
    }

    /// Creates an identity, then its profile, and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::InvalidRequest`] for an empty display name and
    /// [`TixlyError::Auth`] when the identity service rejects the input or
    /// the profile cannot be written.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<AuthSession, TixlyError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(TixlyError::InvalidRequest("full name is required".to_string()));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(TixlyError::InvalidRequest(format!(
                "full name exceeds {MAX_DISPLAY_NAME_LEN} characters"
            )));
        }

        let issued = self
            .identity
            .sign_up(email, password)
            .await
            .map_err(|e| TixlyError::auth(AuthAction::SignUp, e))?;

        let user_id = issued.identity.user_id;
        let profile = Profile::new(user_id, &issued.identity.email, display_name, role);
        if let Err(e) = self.profiles.insert(&profile).await {
            tracing::error!(%user_id, error = %e, "profile write failed after sign-up");
            return Err(TixlyError::auth(
                AuthAction::SignUp,
                AuthError::Unavailable(e.to_string()),
            ));
        }
        self.session.refresh(user_id).await;

        tracing::info!(%user_id, role = %role, "user registered");
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            home_path: Some(profile.role.home_path()),
            profile: Some(profile),
        })
    }

    /// Opens a session for an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::Auth`] on wrong credentials or identity
    /// service failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, TixlyError> {
        let issued = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(|e| TixlyError::auth(AuthAction::SignIn, e))?;

        let user_id = issued.identity.user_id;
        self.session.refresh(user_id).await;
        let profile = match self.profiles.get(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(%user_id, error = %e, "profile read failed after sign-in");
                None
            }
        };

        tracing::info!(%user_id, "user signed in");
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            home_path: profile.as_ref().map(|p| p.role.home_path()),
            profile,
        })
    }

    /// Revokes the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [`TixlyError::Internal`] if the identity service fails.
    pub async fn sign_out(&self, token: &str) -> Result<(), TixlyError> {
        self.identity
            .sign_out(token)
            .await
            .map_err(|e| TixlyError::Internal(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SessionState;
    use crate::identity::InMemoryIdentityProvider;
    use crate::persistence::MemoryProfileStore;

    fn service() -> (AuthService, Arc<SessionContext>) {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(InMemoryIdentityProvider::new(chrono::Duration::hours(1)));
        let profiles: Arc<dyn ProfileStore> = Arc::new(MemoryProfileStore::new());
        let session = Arc::new(SessionContext::new(
            Arc::clone(&identity),
            Arc::clone(&profiles),
        ));
        (
            AuthService::new(identity, profiles, Arc::clone(&session)),
            session,
        )
    }

    #[tokio::test]
    async fn sign_up_creates_profile_and_home_path() {
        let (auth, session) = service();
        let Ok(created) = auth
            .sign_up("budi@example.com", "rahasia123", " Budi ", Role::Organizer)
            .await
        else {
            panic!("sign up failed");
        };
        assert_eq!(created.home_path, Some("/api/v1/organizer/events"));
        let Some(profile) = created.profile else {
            panic!("profile missing");
        };
        assert_eq!(profile.display_name, "Budi");

        let SessionState::Authenticated { profile: Some(p), .. } =
            session.state_for(Some(&created.token)).await
        else {
            panic!("session should see the profile");
        };
        assert_eq!(p.role, Role::Organizer);
    }

    #[tokio::test]
    async fn sign_in_returns_participant_home() {
        let (auth, _) = service();
        let _ = auth
            .sign_up("ani@example.com", "rahasia123", "Ani", Role::Participant)
            .await;
        let Ok(signed_in) = auth.sign_in("ani@example.com", "rahasia123").await else {
            panic!("sign in failed");
        };
        assert_eq!(signed_in.home_path, Some("/api/v1/tickets"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_identity_call() {
        let (auth, _) = service();
        let result = auth
            .sign_up("ani@example.com", "rahasia123", "   ", Role::Participant)
            .await;
        assert!(matches!(result, Err(TixlyError::InvalidRequest(_))));

        let again = auth
            .sign_up("ani@example.com", "rahasia123", "Ani", Role::Participant)
            .await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_has_fixed_message() {
        let (auth, _) = service();
        let _ = auth
            .sign_up("ani@example.com", "rahasia123", "Ani", Role::Participant)
            .await;
        let Err(err) = auth.sign_in("ani@example.com", "salah").await else {
            panic!("sign in should fail");
        };
        assert_eq!(err.to_string(), "Incorrect email or password.");
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let (auth, session) = service();
        let Ok(created) = auth
            .sign_up("ani@example.com", "rahasia123", "Ani", Role::Participant)
            .await
        else {
            panic!("sign up failed");
        };
        assert!(auth.sign_out(&created.token).await.is_ok());
        assert_eq!(
            session.state_for(Some(&created.token)).await,
            SessionState::Unauthenticated
        );
    }
}
