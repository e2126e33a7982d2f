//! Cadence API crate - axum HTTP server and route handlers.
//!
//! Exposes song insert, lookup, delete, similarity search, and bulk import
//! over JSON, plus a health check.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
