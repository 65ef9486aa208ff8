//! Authentication handlers: sign-up, sign-in, sign-out, current profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AuthResponse, ProfileDto, SignInRequest, SignUpRequest};
use crate::api::extractors::SignedIn;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, TixlyError};

/// `POST /auth/sign-up` — Create an account and its profile.
///
/// # Errors
///
/// Returns [`TixlyError::Auth`] when the identity service rejects the
/// input and [`TixlyError::InvalidRequest`] for an empty name.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    tag = "Auth",
    summary = "Sign up",
    description = "Creates an identity, then its profile with the chosen role, and opens a session. The response carries the bearer token and the landing path for the role.",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid email, weak password or empty name", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<impl IntoResponse, TixlyError> {
    let session = state
        .auth_service
        .sign_up(&req.email, &req.password, &req.display_name, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

/// `POST /auth/sign-in` — Open a session.
///
/// # Errors
///
/// Returns [`TixlyError::Auth`] on wrong credentials.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    tag = "Auth",
    summary = "Sign in",
    description = "Opens a session for an existing account. `home_path` is absent when the account has no profile.",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, TixlyError> {
    let session = state.auth_service.sign_in(&req.email, &req.password).await?;
    Ok(Json(AuthResponse::from(session)))
}

/// `POST /auth/sign-out` — Revoke the presented token.
///
/// # Errors
///
/// Returns [`TixlyError::SignInRequired`] without a valid session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    tag = "Auth",
    summary = "Sign out",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Sign in required", body = ErrorResponse),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    caller: SignedIn,
) -> Result<impl IntoResponse, TixlyError> {
    state.auth_service.sign_out(&caller.token).await?;
    tracing::info!(user_id = %caller.identity.user_id, "user signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me` — Current profile.
///
/// # Errors
///
/// Returns [`TixlyError::SignInRequired`] without a session or profile.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    summary = "Current profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller profile", body = ProfileDto),
        (status = 401, description = "Sign in required", body = ErrorResponse),
        (status = 503, description = "Session still loading", body = ErrorResponse),
    )
)]
pub async fn me(caller: SignedIn) -> Result<impl IntoResponse, TixlyError> {
    Ok(Json(ProfileDto::from(caller.profile)))
}

/// Authentication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
}
