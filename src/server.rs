//! Application router: REST API, WebSocket feed, API docs and the
//! HTTP middleware stack.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api;
use crate::api::openapi::ApiDoc;
use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Builds the full application around `state`.
pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));

    let router = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));
    let router = with_api_docs(router);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                )),
        )
        .with_state(state)
}

/// Serves the OpenAPI document, with the Swagger UI on top when enabled.
#[cfg(feature = "swagger-ui")]
fn with_api_docs(router: Router<AppState>) -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;
    router.merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

/// Serves the OpenAPI document, with the Swagger UI on top when enabled.
#[cfg(not(feature = "swagger-ui"))]
fn with_api_docs(router: Router<AppState>) -> Router<AppState> {
    use axum::Json;
    router.route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
