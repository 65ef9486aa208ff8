//! Registration handlers: status check and ticket issuance.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{RegistrationResponse, RegistrationStatusResponse};
use crate::api::extractors::Participant;
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, TixlyError};
use crate::service::RegistrationOutcome;

/// Where a participant's tickets are listed.
pub const TICKETS_PATH: &str = "/api/v1/tickets";

/// `GET /events/{id}/registration` — Does the caller hold a ticket?
///
/// # Errors
///
/// Returns [`TixlyError::SignInRequired`] for non-participants.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/registration",
    tag = "Registration",
    summary = "Registration status",
    description = "A store failure is reported as not registered.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Registration status", body = RegistrationStatusResponse),
        (status = 401, description = "Participant sign-in required", body = ErrorResponse),
    )
)]
pub async fn registration_status(
    State(state): State<AppState>,
    Participant(participant): Participant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, TixlyError> {
    let registered = state
        .registration_service
        .is_registered(participant.user_id, EventId::from_uuid(id))
        .await;
    Ok(Json(RegistrationStatusResponse {
        event_id: id,
        registered,
    }))
}

/// `POST /events/{id}/registration` — Register for a published event.
///
/// # Errors
///
/// Returns [`TixlyError::EventNotFound`], [`TixlyError::EventNotPublished`]
/// or [`TixlyError::RegistrationFailed`].
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/registration",
    tag = "Registration",
    summary = "Register for an event",
    description = "Issues a paid ticket whose code equals its id. Registering twice returns the existing ticket with 200.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 201, description = "Ticket issued", body = RegistrationResponse),
        (status = 200, description = "Already registered", body = RegistrationResponse),
        (status = 401, description = "Participant sign-in required", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event not published", body = ErrorResponse),
        (status = 500, description = "Registration failed", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Participant(participant): Participant,
    Path(id): Path<Uuid>,
) -> Result<Response, TixlyError> {
    let outcome = state
        .registration_service
        .register(&participant, EventId::from_uuid(id))
        .await?;

    let response = match outcome {
        RegistrationOutcome::Registered(ticket) => (
            StatusCode::CREATED,
            [(header::LOCATION, TICKETS_PATH)],
            Json(RegistrationResponse {
                status: "registered",
                ticket: ticket.into(),
                tickets_path: TICKETS_PATH,
            }),
        )
            .into_response(),
        RegistrationOutcome::AlreadyRegistered(ticket) => (
            StatusCode::OK,
            Json(RegistrationResponse {
                status: "already_registered",
                ticket: ticket.into(),
                tickets_path: TICKETS_PATH,
            }),
        )
            .into_response(),
    };
    Ok(response)
}

/// Registration routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/events/{id}/registration",
        get(registration_status).post(register),
    )
}
