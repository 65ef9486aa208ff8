//! User profiles and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Role assigned to a profile at sign-up. Never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses events, registers, holds tickets.
    #[serde(alias = "peserta")]
    Participant,
    /// Creates and publishes events, lists attendees, scans tickets.
    #[serde(alias = "panitia")]
    Organizer,
}

impl Role {
    /// Stable string form used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Organizer => "organizer",
        }
    }

    /// API path a client lands on after signing in with this role.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Participant => "/api/v1/tickets",
            Self::Organizer => "/api/v1/organizer/events",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" | "peserta" => Ok(Self::Participant),
            "organizer" | "panitia" => Ok(Self::Organizer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Profile record stored alongside an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity this profile belongs to (also the record key).
    pub user_id: UserId,
    /// Email captured at sign-up.
    pub email: String,
    /// Full name shown on tickets and attendee lists.
    pub display_name: String,
    /// Immutable role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Builds a fresh profile for a newly created identity.
    #[must_use]
    pub fn new(user_id: UserId, email: &str, display_name: &str, role: Role) -> Self {
        Self {
            user_id,
            email: email.to_string(),
            display_name: display_name.trim().to_string(),
            role,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_role_names_parse() {
        assert_eq!("peserta".parse::<Role>().ok(), Some(Role::Participant));
        assert_eq!("panitia".parse::<Role>().ok(), Some(Role::Organizer));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn legacy_role_names_deserialize() {
        let role: Option<Role> = serde_json::from_str("\"panitia\"").ok();
        assert_eq!(role, Some(Role::Organizer));
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::Participant).unwrap_or_default();
        assert_eq!(json, "\"participant\"");
    }

    #[test]
    fn home_path_depends_on_role() {
        assert_ne!(Role::Participant.home_path(), Role::Organizer.home_path());
    }
}
