//! API request and response types.

use crate::document::{Document, RoutingModeKind};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// ============================================================================
// Config API Types
// ============================================================================

/// Response containing the configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ConfigResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub config: Document,
}

/// Request to switch the active routing mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SetRoutingModeRequest {
    pub mode: RoutingModeKind,
}

/// Response describing the state of the debounced persistence pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SaveStatusResponse {
    /// A save is scheduled but has not hit the disk yet.
    pub pending: bool,
    /// When the last successful save finished (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<String>,
    /// Sticky until the next successful save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

// ============================================================================
// Error Response
// ============================================================================

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
