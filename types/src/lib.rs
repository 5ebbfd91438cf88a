//! Shared types for the klang DSP router configuration editor.
//!
//! This crate contains the configuration document model, the operations
//! that keep it coherent while it is edited, and the API types shared
//! between the backend and any presentation layer.

/// Default port for the klang backend server.
pub const DEFAULT_PORT: u16 = 8090;

pub mod advanced;
pub mod api;
pub mod basic;
pub mod channel;
pub mod crossover;
pub mod document;
pub mod filter;
pub mod output;
pub mod view;

// Re-export commonly used types
pub use advanced::{AdvancedRouting, Route, RouteState};
pub use api::{ConfigResponse, ErrorResponse, SaveStatusResponse, SetRoutingModeRequest};
pub use basic::{BasicRouting, RoleSlot, SpeakerRole};
pub use channel::Channel;
pub use crossover::{Alignment, Crossover, CrossoverType, DEFAULT_Q};
pub use document::{Devices, Document, DocumentError, RoutingMode, RoutingModeKind};
pub use filter::{Filter, FilterRef, FilterType, OutputFilter, ResolvedFilter};
pub use output::{used_channels, Cancellation, Compression, Delay, Output};
