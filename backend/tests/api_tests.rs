//! Integration tests for the Klang API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use klang::state::AppState;
use klang::storage::{JsonFileStorage, Storage};
use klang_types::api::SaveStatusResponse;
use klang_types::Document;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

/// Long enough that a save only happens when a test flushes explicitly.
const TEST_DEBOUNCE: Duration = Duration::from_secs(60);

/// Helper to create a test app backed by a default document in a temporary
/// directory. The directory must outlive the test.
async fn create_test_app() -> (Router, AppState, TempDir) {
    use klang::create_app_with_state;

    let dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(dir.path().join("klang.json"));
    storage.save(&Document::default()).await.unwrap();

    let state = AppState::new(storage, TEST_DEBOUNCE);
    state.load_from_storage().await.unwrap();

    (create_app_with_state(state.clone()), state, dir)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_config_returns_default_document() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let response_json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let config = &response_json["config"];
    assert_eq!(config["description"], "Default config");
    assert_eq!(config["startWithOS"], false);
    assert_eq!(config["basic"]["subwoofer"], "Sub");
    assert!(config.get("advanced").is_none());
    assert_eq!(config["outputs"][0]["channels"], json!(["L", "R"]));
}

#[tokio::test]
async fn test_update_config_round_trips() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut response_json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    response_json["config"]["description"] = json!("Living room 5.1");
    response_json["config"]["basic"]["front"] = json!("Small");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&response_json["config"]).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let updated: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated["config"]["description"], "Living room 5.1");
    assert_eq!(updated["config"]["basic"]["front"], "Small");

    // A later GET sees the same document.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched["config"]["description"], "Living room 5.1");
    assert_eq!(fetched["config"]["basic"]["front"], "Small");
}

#[tokio::test]
async fn test_update_config_rejects_invalid_json() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "Invalid configuration document");
}

#[tokio::test]
async fn test_update_config_rejects_both_routing_modes() {
    let (app, _state, _dir) = create_test_app().await;

    let request_body = json!({
        "description": "conflicted",
        "basic": {},
        "advanced": {}
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(error["details"]
        .as_str()
        .unwrap()
        .contains("both basic and advanced"));
}

#[tokio::test]
async fn test_update_config_migrates_legacy_fields() {
    let (app, _state, _dir) = create_test_app().await;

    // Singular `channel` key and scalar delay, as older documents wrote them.
    let request_body = json!({
        "description": "old file",
        "outputs": [{"channel": "C", "delay": 1.5}]
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let updated: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let output = &updated["config"]["outputs"][0];
    assert_eq!(output["channels"], json!(["C"]));
    assert!(output.get("channel").is_none());
    assert_eq!(output["delay"], json!({"value": 1.5, "unitInMeter": false}));
}

#[tokio::test]
async fn test_undo_restores_last_loaded_document() {
    let (app, _state, _dir) = create_test_app().await;

    let request_body = json!({
        "description": "about to be discarded",
        "basic": {}
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config/undo")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let restored: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(restored["config"]["description"], "Default config");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched["config"]["description"], "Default config");
}

#[tokio::test]
async fn test_switch_routing_mode() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config/routing-mode")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({"mode": "advanced"})).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let switched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(switched["config"].get("basic").is_none());
    assert!(switched["config"].get("advanced").is_some());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config/routing-mode")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({"mode": "basic"})).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let switched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(switched["config"].get("basic").is_some());
    assert!(switched["config"].get("advanced").is_none());
}

#[tokio::test]
async fn test_switch_routing_mode_rejects_unknown_mode() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config/routing-mode")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({"mode": "bogus"})).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_mode_switch_preserves_inactive_payload() {
    let (app, _state, _dir) = create_test_app().await;

    let request_body = json!({
        "description": "Default config",
        "basic": {"front": "Small"}
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for mode in ["advanced", "basic"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/config/routing-mode")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&json!({"mode": mode})).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // The basic payload edited before the detour is back untouched.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched["config"]["basic"]["front"], "Small");
}

#[tokio::test]
async fn test_save_status_lifecycle() {
    let (app, state, _dir) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config/save-status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let status: SaveStatusResponse = serde_json::from_slice(&body).unwrap();
    assert!(!status.pending);
    assert_eq!(status.last_saved_at, None);
    assert_eq!(status.last_error, None);

    let request_body = json!({
        "description": "unsaved edit",
        "basic": {}
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/config/save-status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let status: SaveStatusResponse = serde_json::from_slice(&body).unwrap();
    assert!(status.pending);

    state.flush().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config/save-status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let status: SaveStatusResponse = serde_json::from_slice(&body).unwrap();
    assert!(!status.pending);
    assert!(status.last_saved_at.is_some());
    assert_eq!(status.last_error, None);
}

#[tokio::test]
async fn test_flush_persists_the_pending_edit() {
    let (app, state, dir) = create_test_app().await;

    let request_body = json!({
        "description": "written through",
        "basic": {}
    });
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .method("PUT")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    state.flush().await;

    let contents = std::fs::read_to_string(dir.path().join("klang.json")).unwrap();
    let on_disk: Document = serde_json::from_str(&contents).unwrap();
    assert_eq!(on_disk.description, "written through");
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let (app, _state, _dir) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let spec: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(spec["info"]["title"], "Klang Configuration API");
    assert!(spec["paths"].get("/api/config").is_some());
}
