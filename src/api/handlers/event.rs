//! Event handlers: browse, detail, create, edit, publish, delete, attendees.

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    AttendeeDto, AttendeesResponse, ConfirmParams, EventDto, EventListResponse, EventRequest,
};
use crate::api::extractors::{Organizer, Viewer};
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, TixlyError};

/// `GET /events` — Published events, earliest first.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Browse published events",
    description = "Lists every published event ordered by date ascending. A store failure yields an empty list.",
    responses(
        (status = 200, description = "Published events", body = EventListResponse),
    )
)]
pub async fn list_events(State(state): State<AppState>) -> impl IntoResponse {
    Json(EventListResponse::from(
        state.event_service.list_published().await,
    ))
}

/// `POST /events` — Create a draft event.
///
/// # Errors
///
/// Returns [`TixlyError::InvalidRequest`] on invalid fields.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates a draft owned by the caller. Drafts are invisible to participants until published.",
    security(("bearer_auth" = [])),
    request_body = EventRequest,
    responses(
        (status = 201, description = "Draft created", body = EventDto),
        (status = 400, description = "Invalid event fields", body = ErrorResponse),
        (status = 401, description = "Organizer sign-in required", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, TixlyError> {
    let event = state
        .event_service
        .create_event(&organizer, req.into())
        .await?;
    let location = format!("/api/v1/events/{}", event.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(EventDto::from(event)),
    ))
}

/// `GET /events/{id}` — Event detail.
///
/// # Errors
///
/// Returns [`TixlyError::EventNotFound`] for missing events and for
/// drafts the caller does not own.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get an event",
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, TixlyError> {
    let event = state
        .event_service
        .get_event(EventId::from_uuid(id), viewer.as_ref())
        .await?;
    Ok(Json(EventDto::from(event)))
}

/// `PUT /events/{id}` — Edit an owned event.
///
/// # Errors
///
/// Returns [`TixlyError::NotEventOwner`] for someone else's event.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Edit an event",
    description = "Overwrites name, date, location, price and description. The published flag is unchanged.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventDto),
        (status = 400, description = "Invalid event fields", body = ErrorResponse),
        (status = 403, description = "Not the event owner", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Path(id): Path<Uuid>,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, TixlyError> {
    let event = state
        .event_service
        .update_event(&organizer, EventId::from_uuid(id), req.into())
        .await?;
    Ok(Json(EventDto::from(event)))
}

/// `DELETE /events/{id}?confirm=true` — Delete an owned event.
///
/// # Errors
///
/// Returns [`TixlyError::ConfirmationRequired`] without `confirm=true`.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    description = "Hard-deletes the event. Issued tickets are kept and keep pointing at the deleted id.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
        ConfirmParams,
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Not the event owner", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 428, description = "Confirmation required", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, TixlyError> {
    state
        .event_service
        .delete_event(&organizer, EventId::from_uuid(id), params.confirm)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /events/{id}/publish` — Make an owned event visible.
///
/// # Errors
///
/// Returns [`TixlyError::NotEventOwner`] for someone else's event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/publish",
    tag = "Events",
    summary = "Publish an event",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event published", body = EventDto),
        (status = 403, description = "Not the event owner", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, TixlyError> {
    let event = state
        .event_service
        .set_published(&organizer, EventId::from_uuid(id), true, false)
        .await?;
    Ok(Json(EventDto::from(event)))
}

/// `POST /events/{id}/unpublish?confirm=true` — Hide an owned event.
///
/// # Errors
///
/// Returns [`TixlyError::ConfirmationRequired`] without `confirm=true`.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/unpublish",
    tag = "Events",
    summary = "Unpublish an event",
    description = "Hides the event from participants. Existing tickets stay valid.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
        ConfirmParams,
    ),
    responses(
        (status = 200, description = "Event unpublished", body = EventDto),
        (status = 403, description = "Not the event owner", body = ErrorResponse),
        (status = 428, description = "Confirmation required", body = ErrorResponse),
    )
)]
pub async fn unpublish_event(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, TixlyError> {
    let event = state
        .event_service
        .set_published(&organizer, EventId::from_uuid(id), false, params.confirm)
        .await?;
    Ok(Json(EventDto::from(event)))
}

/// `GET /events/{id}/attendees` — Tickets of an owned event.
///
/// # Errors
///
/// Returns [`TixlyError::NotEventOwner`] for someone else's event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/attendees",
    tag = "Events",
    summary = "List attendees",
    description = "Returns every ticket issued for the event, in no particular order and without pagination.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Attendee list", body = AttendeesResponse),
        (status = 403, description = "Not the event owner", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_attendees(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, TixlyError> {
    let (event, tickets) = state
        .event_service
        .attendees(&organizer, EventId::from_uuid(id))
        .await?;
    let attendees: Vec<AttendeeDto> = tickets.into_iter().map(AttendeeDto::from).collect();
    Ok(Json(AttendeesResponse {
        event: event.into(),
        total: attendees.len(),
        attendees,
    }))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/publish", post(publish_event))
        .route("/events/{id}/unpublish", post(unpublish_event))
        .route("/events/{id}/attendees", get(list_attendees))
}
