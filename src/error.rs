//! Service error types with HTTP status code mapping.
//!
//! [`TixlyError`] is the central error type. Each variant maps to a
//! numeric code, an HTTP status code and a structured JSON body. Store
//! and internal failures are logged in full but reach the client only as
//! a generic message.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EventId;
use crate::identity::{AuthAction, AuthError};
use crate::persistence::StoreError;

/// Sign-in entry point that the access guard redirects to.
pub const SIGN_IN_PATH: &str = "/api/v1/auth/sign-in";

/// Message shown for any failure whose detail must stay server-side.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event not found: 5b0c…"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                     |
/// |-----------|---------------------|---------------------------------|
/// | 1000–1099 | Validation          | 400 / 428                       |
/// | 1100–1199 | Authentication      | 400 / 401 / 409 / 503           |
/// | 1200–1299 | Session / guard     | 401 / 503                       |
/// | 1300–1399 | Ownership           | 403                             |
/// | 2000–2999 | State / Not Found   | 404 / 409                       |
/// | 3000–3999 | Server              | 500                             |
#[derive(Debug, thiserror::Error)]
pub enum TixlyError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A destructive action was requested without confirmation.
    #[error("confirmation required to {0}")]
    ConfirmationRequired(&'static str),

    /// The identity service rejected a sign-up or sign-in.
    #[error("{}", auth_message(.action, .source))]
    Auth {
        /// Which action failed.
        action: AuthAction,
        /// Underlying identity error.
        source: AuthError,
    },

    /// Access guard decided to send the caller to the sign-in entry point.
    #[error("sign in required")]
    SignInRequired,

    /// The caller's session is still resolving.
    #[error("session is loading")]
    SessionLoading,

    /// The caller does not own the event.
    #[error("you are not authorized to manage event {0}")]
    NotEventOwner(EventId),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Ticket not found (by id or code).
    #[error("ticket not found")]
    TicketNotFound,

    /// Registration attempted on a draft event.
    #[error("event {0} is not open for registration")]
    EventNotPublished(EventId),

    /// Registration failed in the store.
    #[error("Registration failed. Please try again.")]
    RegistrationFailed,

    /// Store layer failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Ticket rendering failure.
    #[error("render error: {0}")]
    Render(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TixlyError {
    /// Wraps an identity error raised while performing `action`.
    #[must_use]
    pub const fn auth(action: AuthAction, source: AuthError) -> Self {
        Self::Auth { action, source }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ConfirmationRequired(_) => 1002,
            Self::Auth { source, .. } => match source {
                AuthError::InvalidCredential => 1101,
                AuthError::EmailAlreadyInUse => 1102,
                AuthError::WeakPassword => 1103,
                AuthError::InvalidEmail => 1104,
                AuthError::Unavailable(_) => 1199,
            },
            Self::SignInRequired => 1201,
            Self::SessionLoading => 1202,
            Self::NotEventOwner(_) => 1301,
            Self::EventNotFound(_) => 2001,
            Self::TicketNotFound => 2002,
            Self::EventNotPublished(_) => 2003,
            Self::Internal(_) => 3000,
            Self::Store(_) => 3001,
            Self::RegistrationFailed => 3002,
            Self::Render(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            Self::Auth { source, .. } => match source {
                AuthError::InvalidCredential => StatusCode::UNAUTHORIZED,
                AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
                AuthError::WeakPassword | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
                AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::SignInRequired => StatusCode::UNAUTHORIZED,
            Self::SessionLoading => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotEventOwner(_) => StatusCode::FORBIDDEN,
            Self::EventNotFound(_) | Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::EventNotPublished(_) => StatusCode::CONFLICT,
            Self::RegistrationFailed | Self::Store(_) | Self::Render(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Render(_) | Self::Internal(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

fn auth_message(action: &AuthAction, source: &AuthError) -> &'static str {
    source.user_message(*action)
}

impl IntoResponse for TixlyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && !matches!(self, Self::SessionLoading) {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;

        let headers = response.headers_mut();
        match self {
            Self::SignInRequired => {
                headers.insert(header::LOCATION, HeaderValue::from_static(SIGN_IN_PATH));
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            Self::SessionLoading => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            }
            _ => {}
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_required_carries_location() {
        let response = TixlyError::SignInRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::LOCATION),
            Some(&HeaderValue::from_static(SIGN_IN_PATH))
        );
    }

    #[test]
    fn loading_asks_to_retry() {
        let response = TixlyError::SessionLoading.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[test]
    fn store_detail_is_hidden() {
        let err = TixlyError::Store(StoreError::Backend("connection refused".to_string()));
        assert_eq!(err.public_message(), GENERIC_FAILURE);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_map_to_fixed_messages() {
        let err = TixlyError::auth(AuthAction::SignUp, AuthError::EmailAlreadyInUse);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "This email is already registered.");

        let err = TixlyError::auth(AuthAction::SignIn, AuthError::Unavailable("timeout".into()));
        assert_eq!(err.public_message(), "Failed to sign in. Please try again.");
    }

    #[test]
    fn ownership_is_forbidden() {
        assert_eq!(
            TixlyError::NotEventOwner(EventId::new()).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
