//! HTTP route handlers for the photobooth API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # API
//! POST /api/register           - Store name, email and department in the session
//! POST /api/upload             - Upload a photo (requires registration)
//!
//! # Static
//! GET  /uploads/{dept}/{file}  - Stored images
//! ```

pub mod api;
pub mod health;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(api::register))
        .route("/upload", post(api::upload))
}
