//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single organizer connection,
//! dispatching subscribe commands and forwarding matching domain events.
//! The feed ends once the bearer token behind it stops resolving.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, interval_at};

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{DomainEvent, EventId, UserId};
use crate::identity::{IdentityChange, IdentityProvider};

/// How often an idle feed re-checks its token for expiry.
pub const SESSION_RECHECK_INTERVAL: Duration = Duration::from_secs(60);

/// The session a feed was opened with.
#[derive(Debug)]
pub struct FeedSession {
    /// Identity provider that issued the token.
    pub identity: Arc<dyn IdentityProvider>,
    /// Identity changes, subscribed before the upgrade.
    pub changes: broadcast::Receiver<IdentityChange>,
    /// Bearer token presented on the handshake.
    pub token: String,
    /// Organizer the token resolved to.
    pub organizer_id: UserId,
}

impl FeedSession {
    /// Whether the token still resolves to the organizer. Provider
    /// failures keep the feed open.
    async fn is_live(&self) -> bool {
        match self.identity.current(&self.token).await {
            Ok(Some(identity)) => identity.user_id == self.organizer_id,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "could not re-check ws session");
                true
            }
        }
    }

    /// Whether `change` may have ended this feed's session.
    fn is_affected_by(&self, change: &Result<IdentityChange, RecvError>) -> bool {
        match change {
            Ok(IdentityChange::SignedOut { user_id }) => *user_id == self.organizer_id,
            Ok(IdentityChange::SignedIn(_)) | Err(RecvError::Closed) => false,
            Err(RecvError::Lagged(_)) => true,
        }
    }
}

/// Runs the read/write loop for one organizer.
///
/// - Reads commands from the client and replies to each.
/// - Forwards the organizer's matching events from the bus.
/// - Closes the socket once the organizer signs out or the token expires.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DomainEvent>,
    mut session: FeedSession,
) {
    let organizer_id = session.organizer_id;
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new(organizer_id);
    let mut recheck = interval_at(
        Instant::now() + SESSION_RECHECK_INTERVAL,
        SESSION_RECHECK_INTERVAL,
    );
    let mut changes_open = true;

    loop {
        tokio::select! {
            change = session.changes.recv(), if changes_open => {
                if matches!(change, Err(RecvError::Closed)) {
                    changes_open = false;
                    continue;
                }
                if session.is_affected_by(&change) && !session.is_live().await {
                    close_ended_session(&mut ws_tx, organizer_id).await;
                    break;
                }
            }
            _ = recheck.tick() => {
                if !session.is_live().await {
                    close_ended_session(&mut ws_tx, organizer_id).await;
                    break;
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if let Some(json) = encode(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(domain_event) => {
                        if !subs.matches(&domain_event) {
                            continue;
                        }
                        let payload = match serde_json::to_value(&domain_event) {
                            Ok(v) => v,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to encode domain event");
                                continue;
                            }
                        };
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            payload,
                        );
                        if let Some(json) = encode(&msg)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(
                            lagged = n,
                            user_id = %organizer_id,
                            "ws client lagged behind event bus"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(user_id = %organizer_id, "ws connection closed");
}

async fn close_ended_session(ws_tx: &mut SplitSink<WebSocket, Message>, organizer_id: UserId) {
    tracing::info!(user_id = %organizer_id, "session ended, closing organizer feed");
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: "session ended".into(),
    };
    let _ = ws_tx.send(Message::Close(Some(frame))).await;
}

fn encode(msg: &WsMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode ws message");
            None
        }
    }
}

/// Splits raw ids into parsed event ids and the wildcard flag. Ids that
/// are not UUIDs are ignored.
fn parse_ids(raw: &[String]) -> (Vec<EventId>, bool) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(id) = s.parse::<EventId>() {
            ids.push(id);
        }
    }
    (ids, wildcard)
}

/// Handles one client text frame and builds the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { event_ids } => {
            let (ids, wildcard) = parse_ids(&event_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { event_ids } => {
            let (ids, wildcard) = parse_ids(&event_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
    }
}
