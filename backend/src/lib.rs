//! Klang backend library.
//!
//! This module exposes the application builder for use in tests.

use axum::http::{header, Method};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod config;
pub mod openapi;
pub mod paths;
pub mod saver;
pub mod state;
pub mod storage;

use state::AppState;

/// Create the Axum application router with a given state.
///
/// This function is used both by the main server binary and by integration tests.
pub fn create_app_with_state(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/config", get(api::config::get_config))
        .route("/config", put(api::config::update_config))
        .route("/config/undo", post(api::config::undo_config))
        .route("/config/routing-mode", post(api::config::set_routing_mode))
        .route("/config/save-status", get(api::config::save_status));

    Router::new()
        .route("/health", get(health))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .nest("/api", api_router)
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_origin(Any),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
