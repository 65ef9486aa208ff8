//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::TixlyConfig;
use crate::domain::EventBus;
use crate::identity::{IdentityProvider, InMemoryIdentityProvider, PostgresIdentityProvider};
use crate::persistence::Stores;
use crate::render::TicketRenderer;
use crate::service::{
    AuthService, EventService, RegistrationService, SessionContext, TicketService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<TixlyConfig>,
    /// Identity provider.
    pub identity: Arc<dyn IdentityProvider>,
    /// Session context consulted by the access guard.
    pub session: Arc<SessionContext>,
    /// Sign-up, sign-in and sign-out.
    pub auth_service: Arc<AuthService>,
    /// Event CRUD, publishing and dashboard.
    pub event_service: Arc<EventService>,
    /// Ticket issuance.
    pub registration_service: Arc<RegistrationService>,
    /// Ticket views, QR export and scanning.
    pub ticket_service: Arc<TicketService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service over the given stores, then starts the
    /// session listener. Accounts and sessions go to the same database as
    /// the stores when they are persistent, and stay in memory otherwise.
    pub async fn new(config: TixlyConfig, stores: Stores) -> Self {
        let identity: Arc<dyn IdentityProvider> = match &stores.pool {
            Some(pool) => Arc::new(PostgresIdentityProvider::new(
                pool.clone(),
                config.session_ttl(),
            )),
            None => Arc::new(InMemoryIdentityProvider::new(config.session_ttl())),
        };
        Self::with_identity(config, stores, identity).await
    }

    /// Same as [`AppState::new`] with a caller-supplied identity provider.
    pub async fn with_identity(
        config: TixlyConfig,
        stores: Stores,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let renderer = TicketRenderer::new(config.qr_size_px, config.qr_padding_px);

        let session = Arc::new(SessionContext::new(
            Arc::clone(&identity),
            Arc::clone(&stores.profiles),
        ));
        session.start().await;

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&identity),
            Arc::clone(&stores.profiles),
            Arc::clone(&session),
        ));
        let event_service = Arc::new(EventService::new(
            Arc::clone(&stores.events),
            Arc::clone(&stores.tickets),
            event_bus.clone(),
        ));
        let registration_service = Arc::new(RegistrationService::new(
            Arc::clone(&stores.events),
            Arc::clone(&stores.tickets),
            event_bus.clone(),
            config.issuance_mode,
        ));
        let ticket_service = Arc::new(TicketService::new(
            Arc::clone(&stores.events),
            Arc::clone(&stores.tickets),
            renderer,
        ));

        tracing::info!(issuance_mode = %config.issuance_mode, "application state ready");
        Self {
            config: Arc::new(config),
            identity,
            session,
            auth_service,
            event_service,
            registration_service,
            ticket_service,
            event_bus,
        }
    }
}
