//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                    - Liveness check
//! GET    /health/ready                              - Readiness check (store ping)
//!
//! # Photos (bearer token required)
//! GET    /api/{user_id}/photos/{id}                 - Photo by ID
//! POST   /api/{user_id}/photos/{id}                 - Upload a photo to ad {id}
//! POST   /api/{user_id}/photos/{id}/setMain/{photo_id} - Make a photo the main photo
//! DELETE /api/{user_id}/photos/{id}/{photo_id}      - Delete a photo
//!
//! # Users (bearer token required)
//! GET    /api/users/{id}                            - User profile
//! ```
//!
//! The photo routes share `{id}` at the same position, so the GET handler
//! reads it as a photo ID and the others as an ad ID.

pub mod health;
pub mod photos;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route(
            "/api/{user_id}/photos/{id}",
            get(photos::get_photo).post(photos::add_photo),
        )
        .route(
            "/api/{user_id}/photos/{id}/setMain/{photo_id}",
            post(photos::set_main_photo),
        )
        .route(
            "/api/{user_id}/photos/{id}/{photo_id}",
            delete(photos::delete_photo),
        )
        .route("/api/users/{id}", get(users::get_user))
}
