//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod event;
pub mod organizer;
pub mod registration;
pub mod system;
pub mod ticket;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(event::routes())
        .merge(registration::routes())
        .merge(organizer::routes())
        .merge(ticket::routes())
}
