//! Ticket handlers: my tickets, QR export and door scanning.

use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{MyTicketDto, MyTicketsResponse, ScanRequest, ScanResponse};
use crate::api::extractors::{Organizer, Participant};
use crate::app_state::AppState;
use crate::domain::TicketId;
use crate::error::{ErrorResponse, TixlyError};

/// `GET /tickets` — The caller's tickets, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "My tickets",
    description = "Lists the caller's tickets joined with their events. The event is absent when it has been deleted.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ticket list", body = MyTicketsResponse),
        (status = 401, description = "Participant sign-in required", body = ErrorResponse),
    )
)]
pub async fn my_tickets(
    State(state): State<AppState>,
    Participant(participant): Participant,
) -> impl IntoResponse {
    let data = state
        .ticket_service
        .my_tickets(&participant)
        .await
        .into_iter()
        .map(MyTicketDto::from)
        .collect();
    Json(MyTicketsResponse { data })
}

/// `GET /tickets/{id}/qr.png` — Download a ticket's QR code.
///
/// # Errors
///
/// Returns [`TixlyError::TicketNotFound`] for someone else's ticket.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}/qr.png",
    tag = "Tickets",
    summary = "Download ticket QR",
    description = "PNG of the ticket's QR code on a white padded canvas, served as an attachment.",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Ticket UUID"),
    ),
    responses(
        (status = 200, description = "PNG image", content_type = "image/png", body = Vec<u8>),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    )
)]
pub async fn ticket_qr(
    State(state): State<AppState>,
    Participant(participant): Participant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, TixlyError> {
    let export = state
        .ticket_service
        .export_qr(&participant, TicketId::from_uuid(id))
        .await?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        header_safe(&export.file_name)
    ))
    .map_err(|e| TixlyError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.png,
    ))
}

/// `POST /tickets/scan` — Look up a scanned code.
///
/// # Errors
///
/// Returns [`TixlyError::TicketNotFound`] for an unknown code and
/// [`TixlyError::NotEventOwner`] for another organizer's ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/scan",
    tag = "Tickets",
    summary = "Scan a ticket",
    description = "Resolves a QR code to its ticket and event. Read-only: the ticket is not marked as used.",
    security(("bearer_auth" = [])),
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan result", body = ScanResponse),
        (status = 403, description = "Ticket belongs to another organizer's event", body = ErrorResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse),
    )
)]
pub async fn scan_ticket(
    State(state): State<AppState>,
    Organizer(organizer): Organizer,
    Json(req): Json<ScanRequest>,
) -> Result<impl IntoResponse, TixlyError> {
    let result = state.ticket_service.scan(&organizer, &req.code).await?;
    Ok(Json(ScanResponse::from(result)))
}

/// Replaces characters that cannot appear in a quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Ticket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(my_tickets))
        .route("/tickets/scan", post(scan_ticket))
        .route("/tickets/{id}/qr.png", get(ticket_qr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_safe_strips_quotes_and_non_ascii() {
        assert_eq!(header_safe("Tixly-Ticket-Gig.png"), "Tixly-Ticket-Gig.png");
        assert_eq!(header_safe("Tixly-Ticket-\"Kopi\"_Café.png"), "Tixly-Ticket-_Kopi__Caf_.png");
    }
}
