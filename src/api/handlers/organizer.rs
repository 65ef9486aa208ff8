//! Organizer dashboard handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::DashboardResponse;
use crate::api::extractors::Organizer;
use crate::app_state::AppState;
use crate::error::ErrorResponse;

/// `GET /organizer/events` — The caller's events, split by state.
#[utoipa::path(
    get,
    path = "/api/v1/organizer/events",
    tag = "Organizer",
    summary = "Organizer dashboard",
    description = "Events owned by the caller, partitioned into published and drafts, each ordered by date descending. A store failure yields empty groups.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Organizer sign-in required", body = ErrorResponse),
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
) -> impl IntoResponse {
    Json(DashboardResponse::from(
        state.event_service.dashboard(&organizer).await,
    ))
}

/// Organizer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/organizer/events", get(dashboard))
}
