//! API handlers.

pub mod config;
