//! Authentication DTOs: sign-up, sign-in and profile views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Profile, Role};
use crate::service::AuthSession;

/// Request body for `POST /auth/sign-up`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    /// Account email.
    pub email: String,
    /// Password, at least 6 characters.
    pub password: String,
    /// Full name shown on tickets.
    #[serde(alias = "full_name")]
    pub display_name: String,
    /// `participant` or `organizer`.
    pub role: Role,
}

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    /// Account email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Profile view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileDto {
    /// Identity id.
    pub user_id: Uuid,
    /// Email captured at sign-up.
    pub email: String,
    /// Full name.
    pub display_name: String,
    /// Role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileDto {
    fn from(p: Profile) -> Self {
        Self {
            user_id: *p.user_id.as_uuid(),
            email: p.email,
            display_name: p.display_name,
            role: p.role,
            created_at: p.created_at,
        }
    }
}

/// Response body for sign-up and sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Caller profile, absent if the account has none.
    pub profile: Option<ProfileDto>,
    /// Landing path for the caller's role.
    pub home_path: Option<String>,
}

impl From<AuthSession> for AuthResponse {
    fn from(s: AuthSession) -> Self {
        Self {
            token: s.token,
            token_type: "Bearer",
            expires_at: s.expires_at,
            profile: s.profile.map(ProfileDto::from),
            home_path: s.home_path.map(str::to_string),
        }
    }
}
