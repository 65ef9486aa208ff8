//! OpenAPI document for the REST API.
//!
//! Served as JSON at `/api-docs/openapi.json` and, with the `swagger-ui`
//! feature, browsable at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::{Components, OpenApi as OpenApiSpec};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    AttendeeDto, AttendeesResponse, AuthResponse, DashboardResponse, EventDto, EventListResponse,
    EventRequest, MyTicketDto, MyTicketsResponse, ProfileDto,
    RegistrationResponse, RegistrationStatusResponse, ScanRequest, ScanResponse, SignInRequest,
    SignUpRequest, TicketDto,
};
use crate::api::handlers::{auth, event, organizer, registration, system, ticket};
use crate::domain::{Role, TicketStatus};
use crate::error::{ErrorBody, ErrorResponse};

/// Registers the bearer token scheme referenced by guarded paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut OpenApiSpec) {
        let components = openapi.components.get_or_insert_with(Components::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Opaque session token returned by sign-up or sign-in"))
                    .build(),
            ),
        );
    }
}

/// Aggregated OpenAPI document.
#[derive(Debug, OpenApi)]
#[openapi(
    modifiers(&BearerAuth),
    info(
        title = "Tixly API",
        description = "Event ticketing: organizers publish events, participants register and receive QR-coded tickets."
    ),
    paths(
        auth::sign_up,
        auth::sign_in,
        auth::sign_out,
        auth::me,
        event::list_events,
        event::create_event,
        event::get_event,
        event::update_event,
        event::delete_event,
        event::publish_event,
        event::unpublish_event,
        event::list_attendees,
        registration::registration_status,
        registration::register,
        organizer::dashboard,
        ticket::my_tickets,
        ticket::ticket_qr,
        ticket::scan_ticket,
        system::health_handler,
    ),
    components(schemas(
        SignUpRequest,
        SignInRequest,
        ProfileDto,
        AuthResponse,
        EventRequest,
        EventDto,
        EventListResponse,
        DashboardResponse,
        AttendeeDto,
        AttendeesResponse,
        RegistrationStatusResponse,
        RegistrationResponse,
        TicketDto,
        MyTicketDto,
        MyTicketsResponse,
        ScanRequest,
        ScanResponse,
        ErrorResponse,
        ErrorBody,
        Role,
        TicketStatus,
        system::HealthResponse,
    )),
    tags(
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Events", description = "Event browsing and management"),
        (name = "Registration", description = "Ticket issuance"),
        (name = "Organizer", description = "Organizer dashboard"),
        (name = "Tickets", description = "Participant tickets and door scanning"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/sign-up",
            "/api/v1/events/{id}",
            "/api/v1/events/{id}/registration",
            "/api/v1/tickets/{id}/qr.png",
            "/api/v1/tickets/scan",
            "/api/v1/organizer/events",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let has_scheme = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"));
        assert!(has_scheme);
    }
}
