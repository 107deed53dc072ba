//! API endpoints.

pub mod admin;
pub mod assignments;
pub mod payments;
pub mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/assignments", assignments::router())
        .nest("/payments", payments::router())
        .nest("/admin", admin::router())
}
