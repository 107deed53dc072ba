//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use academy_core::{
    ActivityLogService, AssignmentService, LifecycleService, PaymentService, StatsService,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub assignment_service: AssignmentService,
    pub lifecycle_service: LifecycleService,
    pub payment_service: PaymentService,
    pub activity_log_service: ActivityLogService,
    pub stats_service: StatsService,
}

/// Authentication middleware.
///
/// Resolves a bearer token to a user row and stashes it in request
/// extensions; endpoints pick it up through the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
