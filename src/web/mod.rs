//! HTTP surface: pages, form endpoints and the session middleware

pub mod handlers;
pub mod middleware;
pub mod state;
pub mod views;

pub use state::{AppState, BoardRegistry};

use crate::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use handlers::*;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Request failed: {:?}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

/// Build the application router
pub fn router(state: AppState, assets_dir: &str) -> Router {
    let events = Router::new()
        .route("/events", post(submit_event_handler))
        .route("/events/{id}/edit", get(edit_event_handler))
        .route("/events/{id}/toggle", post(toggle_event_handler))
        .route(
            "/events/{id}/delete",
            get(confirm_delete_handler).post(delete_event_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/auth", post(auth_handler))
        .route("/logout", post(logout_handler))
        .route("/health", get(health_handler))
        .merge(events)
        .nest_service("/assets", ServeDir::new(assets_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
