//! User endpoints.

use axum::{Json, Router, extract::State, routing::post};
use academy_common::AppResult;
use academy_core::{RegisterUserInput, UpdateProfileInput};
use academy_db::entities::user;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: user::UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            region: u.region,
            country: u.country,
            school_level: u.school_level,
            department: u.department,
            created_at: u.created_at.to_rfc3339(),
            last_login: u.last_login.map(|t| t.to_rfc3339()),
        }
    }
}

/// Registration response: the profile plus the access token the client
/// authenticates with from now on.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Register a new user.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let user = state.user_service.register(req).await?;
    let token = user.token.clone().unwrap_or_default();
    Ok(ApiResponse::ok(RegisterResponse {
        user: user.into(),
        token,
    }))
}

/// Fetch the authenticated user's profile.
async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

/// Record a login for the audit trail.
async fn login(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserResponse>> {
    state.user_service.record_login(&user).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update the authenticated user's profile fields.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update_profile(&user, req).await?;
    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", post(me))
        .route("/login", post(login))
        .route("/update", post(update_profile))
}
