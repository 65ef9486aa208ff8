//! Role-based access guard.
//!
//! [`AccessGuard::decide`] is a pure function of the current
//! [`SessionState`] and a set of permitted roles. It never redirects while
//! the session is still resolving, and it never distinguishes "not signed
//! in" from "wrong role" or "no profile".

use super::{Profile, Role};
use crate::identity::Identity;

/// Roles allowed on participant-only routes.
pub const PARTICIPANT_ONLY: &[Role] = &[Role::Participant];

/// Roles allowed on organizer-only routes.
pub const ORGANIZER_ONLY: &[Role] = &[Role::Organizer];

/// Routes open to any signed-in user with a profile.
pub const ANY_ROLE: &[Role] = &[Role::Participant, Role::Organizer];

/// Resolution state of a caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The identity is known but its profile is still being fetched.
    Loading,
    /// No identity.
    Unauthenticated,
    /// Identity resolved; the profile may be missing.
    Authenticated {
        /// Resolved identity.
        identity: Identity,
        /// Profile record, if one exists.
        profile: Option<Profile>,
    },
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Show a neutral loading indicator and check again later.
    Loading,
    /// Send the caller to the sign-in entry point.
    Redirect,
    /// Render the protected view.
    Allow {
        /// Caller identity.
        identity: Identity,
        /// Caller profile, guaranteed to carry a permitted role.
        profile: Profile,
    },
}

/// Gate in front of a set of role-restricted views.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    allowed: &'static [Role],
}

impl AccessGuard {
    /// Creates a guard permitting the given roles.
    #[must_use]
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Decides whether the session may see the protected view.
    #[must_use]
    pub fn decide(&self, state: SessionState) -> AccessDecision {
        match state {
            SessionState::Loading => AccessDecision::Loading,
            SessionState::Unauthenticated
            | SessionState::Authenticated { profile: None, .. } => AccessDecision::Redirect,
            SessionState::Authenticated {
                identity,
                profile: Some(profile),
            } => {
                if self.allowed.contains(&profile.role) {
                    AccessDecision::Allow { identity, profile }
                } else {
                    AccessDecision::Redirect
                }
            }
        }
    }
}
