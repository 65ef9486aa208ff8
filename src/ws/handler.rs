//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::{FeedSession, run_connection};
use crate::api::extractors::bearer_token;
use crate::app_state::AppState;
use crate::domain::access::ORGANIZER_ONLY;
use crate::domain::{AccessDecision, AccessGuard};
use crate::error::TixlyError;

/// Query string of the upgrade request. Browsers cannot set headers on a
/// WebSocket handshake, so the token travels here.
#[derive(Debug, Default, Deserialize)]
pub struct WsAuthParams {
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /ws?token=…` — Upgrade an organizer connection to WebSocket.
///
/// # Errors
///
/// Returns [`TixlyError::SignInRequired`] for anyone but a signed-in
/// organizer and [`TixlyError::SessionLoading`] while the profile is
/// still resolving.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, TixlyError> {
    let token = params.token.as_deref().or_else(|| bearer_token(&headers));
    let current = state.session.state_for(token).await;
    let profile = match AccessGuard::new(ORGANIZER_ONLY).decide(current) {
        AccessDecision::Allow { profile, .. } => profile,
        AccessDecision::Loading => return Err(TixlyError::SessionLoading),
        AccessDecision::Redirect => return Err(TixlyError::SignInRequired),
    };

    let feed = FeedSession {
        identity: Arc::clone(&state.identity),
        changes: state.identity.subscribe(),
        token: token.unwrap_or_default().to_string(),
        organizer_id: profile.user_id,
    };
    let event_rx = state.event_bus.subscribe();
    tracing::info!(user_id = %profile.user_id, "organizer feed connected");
    Ok(ws.on_upgrade(move |socket| run_connection(socket, event_rx, feed)))
}
