//! Admin console endpoints.
//!
//! Privileged surface: aggregate stats, browse/filter assignments, users,
//! payments and activity, and the status override.

use axum::{Json, Router, extract::State, routing::post};
use academy_common::{AppError, AppResult};
use academy_core::{AdminSetStatusInput, AssignmentStatus, DashboardStats, PaymentStatus};
use academy_db::entities::{activity_log, payment};
use academy_db::repositories::AssignmentFilter;
use serde::{Deserialize, Serialize};

use crate::endpoints::assignments::AssignmentResponse;
use crate::endpoints::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

const fn default_limit() -> u64 {
    50
}

/// Dashboard stats.
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = state.stats_service.dashboard(&user).await?;
    Ok(ApiResponse::ok(stats))
}

/// Assignment listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssignmentsRequest {
    pub status: Option<AssignmentStatus>,
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Assignment listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssignmentsResponse {
    pub assignments: Vec<AssignmentResponse>,
    /// Total rows matching the filter, ignoring pagination.
    pub count: u64,
}

/// Browse assignments with status filter and substring search.
async fn list_assignments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListAssignmentsRequest>,
) -> AppResult<ApiResponse<ListAssignmentsResponse>> {
    let filter = AssignmentFilter {
        status: req.status,
        search: req.search,
        limit: req.limit,
        offset: req.offset,
    };

    let (assignments, count) = state.assignment_service.list_all(&user, &filter).await?;

    Ok(ApiResponse::ok(ListAssignmentsResponse {
        assignments: assignments.into_iter().map(Into::into).collect(),
        count,
    }))
}

/// User listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Browse users.
async fn list_users(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListUsersRequest>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state
        .user_service
        .list(&user, req.limit.min(200), req.offset)
        .await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Payment listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsRequest {
    pub status: Option<PaymentStatus>,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// Payment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub assignment_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub provider: String,
    pub transaction_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_transaction_id: Option<String>,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(p: payment::Model) -> Self {
        Self {
            id: p.id,
            assignment_id: p.assignment_id,
            user_id: p.user_id,
            amount: p.amount,
            currency: p.currency,
            provider: p.provider,
            transaction_reference: p.transaction_reference,
            provider_transaction_id: p.provider_transaction_id,
            status: p.status,
            metadata: p.metadata,
            created_at: p.created_at.to_rfc3339(),
            completed_at: p.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Browse payments.
async fn list_payments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListPaymentsRequest>,
) -> AppResult<ApiResponse<Vec<PaymentResponse>>> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin only".to_string()));
    }

    let payments = state
        .payment_service
        .list(req.status, req.limit.min(200))
        .await?;
    Ok(ApiResponse::ok(
        payments.into_iter().map(Into::into).collect(),
    ))
}

/// Activity log listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLogsRequest {
    pub limit: Option<u64>,
    pub assignment_id: Option<String>,
    pub user_id: Option<String>,
}

/// Activity log entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: academy_core::ActivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub description: String,
    pub timestamp: String,
}

impl From<activity_log::Model> for ActivityLogResponse {
    fn from(entry: activity_log::Model) -> Self {
        Self {
            id: entry.id,
            event_type: entry.event_type,
            user_id: entry.user_id,
            user_name: entry.user_name,
            user_email: entry.user_email,
            assignment_id: entry.assignment_id,
            payment_id: entry.payment_id,
            description: entry.description,
            timestamp: entry.created_at.to_rfc3339(),
        }
    }
}

/// Browse the activity trail, newest first.
async fn list_logs(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListLogsRequest>,
) -> AppResult<ApiResponse<Vec<ActivityLogResponse>>> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin only".to_string()));
    }

    let logs = if let Some(assignment_id) = req.assignment_id.as_deref() {
        state
            .activity_log_service
            .list_for_assignment(assignment_id, req.limit)
            .await?
    } else if let Some(user_id) = req.user_id.as_deref() {
        state
            .activity_log_service
            .list_for_user(user_id, req.limit)
            .await?
    } else {
        state.activity_log_service.list(req.limit).await?
    };

    Ok(ApiResponse::ok(logs.into_iter().map(Into::into).collect()))
}

/// Status override request. Unknown status values are rejected at
/// deserialization: the enumeration is closed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub assignment_id: String,
    pub status: AssignmentStatus,
    pub payment_amount: Option<f64>,
    pub notes: Option<String>,
}

/// Privileged status override.
async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<AssignmentResponse>> {
    let assignment = state
        .lifecycle_service
        .admin_set_status(
            &user,
            AdminSetStatusInput {
                assignment_id: req.assignment_id,
                status: req.status,
                payment_amount: req.payment_amount,
                note: req.notes,
            },
        )
        .await?;

    Ok(ApiResponse::ok(assignment.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", post(stats))
        .route("/assignments", post(list_assignments))
        .route("/users", post(list_users))
        .route("/payments", post(list_payments))
        .route("/logs", post(list_logs))
        .route("/update-status", post(update_status))
}
