//! Request extractors that run the access guard.
//!
//! Each guarded extractor reads the `Authorization: Bearer <token>`
//! header, asks the [`crate::service::SessionContext`] for the caller's
//! session state and applies an [`AccessGuard`]. A loading session is
//! rejected with [`TixlyError::SessionLoading`]; every other refusal is
//! the same [`TixlyError::SignInRequired`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};

use crate::app_state::AppState;
use crate::domain::access::{ANY_ROLE, ORGANIZER_ONLY, PARTICIPANT_ONLY};
use crate::domain::{AccessDecision, AccessGuard, Profile, Role, SessionState};
use crate::error::TixlyError;
use crate::identity::Identity;

/// Returns the bearer token of the `Authorization` header, if any.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller and applies a guard for `allowed` roles.
///
/// # Errors
///
/// Returns [`TixlyError::SessionLoading`] while the profile is being
/// fetched and [`TixlyError::SignInRequired`] for every refusal.
pub async fn authorize(
    headers: &HeaderMap,
    state: &AppState,
    allowed: &'static [Role],
) -> Result<(Identity, Profile), TixlyError> {
    let session = state.session.state_for(bearer_token(headers)).await;
    match AccessGuard::new(allowed).decide(session) {
        AccessDecision::Allow { identity, profile } => Ok((identity, profile)),
        AccessDecision::Loading => Err(TixlyError::SessionLoading),
        AccessDecision::Redirect => Err(TixlyError::SignInRequired),
    }
}

/// Caller with the participant role.
#[derive(Debug, Clone)]
pub struct Participant(pub Profile);

impl FromRequestParts<AppState> for Participant {
    type Rejection = TixlyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (_, profile) = authorize(&parts.headers, state, PARTICIPANT_ONLY).await?;
        Ok(Self(profile))
    }
}

/// Caller with the organizer role.
#[derive(Debug, Clone)]
pub struct Organizer(pub Profile);

impl FromRequestParts<AppState> for Organizer {
    type Rejection = TixlyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (_, profile) = authorize(&parts.headers, state, ORGANIZER_ONLY).await?;
        Ok(Self(profile))
    }
}

/// Any caller with a profile, plus the token they presented.
#[derive(Debug, Clone)]
pub struct SignedIn {
    /// Caller identity.
    pub identity: Identity,
    /// Caller profile.
    pub profile: Profile,
    /// Bearer token of this request.
    pub token: String,
}

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = TixlyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (identity, profile) = authorize(&parts.headers, state, ANY_ROLE).await?;
        let token = bearer_token(&parts.headers)
            .map(str::to_string)
            .ok_or(TixlyError::SignInRequired)?;
        Ok(Self {
            identity,
            profile,
            token,
        })
    }
}

/// Optional caller profile for public views. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Profile>);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let profile = match state.session.state_for(bearer_token(&parts.headers)).await {
            SessionState::Authenticated { profile, .. } => profile,
            SessionState::Loading | SessionState::Unauthenticated => None,
        };
        Ok(Self(profile))
    }
}
