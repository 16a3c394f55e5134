//! Packsched Extender - HTTP scheduler-extender surface
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - `/filter` and `/prioritize` extender endpoints
//! - Health probes

pub mod error;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use error::{ApiError, Result};
pub use server::{Config, ExtenderServer};
pub use state::AppState;
