//! Configuration API handlers.

use axum::{extract::State, http::StatusCode, Json};
use klang_types::api::{ConfigResponse, ErrorResponse, SaveStatusResponse, SetRoutingModeRequest};
use klang_types::Document;
use tracing::{error, info};
use utoipa;

use crate::state::AppState;

/// Get the full configuration document.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = state.get_document().await;
    Json(ConfigResponse { config })
}

/// Replace the configuration document.
///
/// The payload goes through the same normalization as a document loaded from
/// disk: legacy shapes are migrated and channel lists re-sorted, so the
/// response can differ cosmetically from what was submitted.
#[utoipa::path(
    put,
    path = "/api/config",
    tag = "config",
    responses(
        (status = 200, description = "Configuration replaced", body = ConfigResponse),
        (status = 422, description = "Malformed or invariant-violating document", body = ErrorResponse)
    )
)]
pub async fn update_config(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ConfigResponse>, (StatusCode, Json<ErrorResponse>)> {
    let config: Document = serde_json::from_str(&body).map_err(|e| {
        error!("Rejected configuration update: {}", e);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::with_details(
                "Invalid configuration document",
                e.to_string(),
            )),
        )
    })?;

    info!("Replacing configuration (\"{}\")", config.description);
    state.replace_document(config.clone()).await;

    Ok(Json(ConfigResponse { config }))
}

/// Discard all edits made since the configuration was loaded.
#[utoipa::path(
    post,
    path = "/api/config/undo",
    tag = "config",
    responses(
        (status = 200, description = "Configuration restored to its loaded state", body = ConfigResponse)
    )
)]
pub async fn undo_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    info!("Undoing configuration edits");
    let config = state.undo().await;
    Json(ConfigResponse { config })
}

/// Switch between basic and advanced routing.
///
/// The payload last seen in the target mode is reinstalled, so switching
/// back and forth does not lose edits.
#[utoipa::path(
    post,
    path = "/api/config/routing-mode",
    tag = "config",
    request_body = SetRoutingModeRequest,
    responses(
        (status = 200, description = "Routing mode switched", body = ConfigResponse)
    )
)]
pub async fn set_routing_mode(
    State(state): State<AppState>,
    Json(req): Json<SetRoutingModeRequest>,
) -> Json<ConfigResponse> {
    info!("Switching routing mode to {:?}", req.mode);
    let config = state.set_routing_mode(req.mode).await;
    Json(ConfigResponse { config })
}

/// Report whether edits have been written to disk.
#[utoipa::path(
    get,
    path = "/api/config/save-status",
    tag = "config",
    responses(
        (status = 200, description = "Persistence status", body = SaveStatusResponse)
    )
)]
pub async fn save_status(State(state): State<AppState>) -> Json<SaveStatusResponse> {
    let status = state.save_status().await;
    Json(SaveStatusResponse {
        pending: status.pending,
        last_saved_at: status.last_saved_at.map(|t| t.to_rfc3339()),
        last_error: status.last_error,
    })
}
