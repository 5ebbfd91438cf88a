//! OpenAPI documentation configuration.

use klang_types::api::{ConfigResponse, ErrorResponse, SaveStatusResponse, SetRoutingModeRequest};
use klang_types::RoutingModeKind;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::config::get_config,
        crate::api::config::update_config,
        crate::api::config::undo_config,
        crate::api::config::set_routing_mode,
        crate::api::config::save_status,
    ),
    components(
        schemas(
            ConfigResponse,
            SetRoutingModeRequest,
            RoutingModeKind,
            SaveStatusResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "config", description = "Configuration document endpoints")
    ),
    info(
        title = "Klang Configuration API",
        version = "0.2.0",
        description = "REST API for editing an audio DSP router configuration",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
