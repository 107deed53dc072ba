//! Assignment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use academy_common::AppResult;
use academy_core::{PricingDecision, SubmitAssignmentInput};
use academy_db::entities::assignment::Model as AssignmentModel;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Assignment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub assignment_type: String,
    pub course_name: String,
    pub class_name: String,
    pub teacher_name: String,
    pub due_date: String,
    pub platform: String,
    pub platform_contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub files: serde_json::Value,
    pub status: academy_core::AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<AssignmentModel> for AssignmentResponse {
    fn from(a: AssignmentModel) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            user_name: a.user_name,
            user_email: a.user_email,
            assignment_type: a.assignment_type,
            course_name: a.course_name,
            class_name: a.class_name,
            teacher_name: a.teacher_name,
            due_date: a.due_date.to_rfc3339(),
            platform: a.platform,
            platform_contact: a.platform_contact,
            description: a.description,
            files: a.files,
            status: a.status,
            payment_amount: a.payment_amount,
            payment_currency: a.payment_currency,
            complexity: a.complexity,
            estimated_hours: a.estimated_hours,
            payment_id: a.payment_id,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List the authenticated user's assignments.
async fn list_assignments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AssignmentResponse>>> {
    let assignments = state.assignment_service.list_own(&user).await?;
    Ok(ApiResponse::ok(
        assignments.into_iter().map(Into::into).collect(),
    ))
}

/// Submit a new assignment.
async fn create_assignment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubmitAssignmentInput>,
) -> AppResult<ApiResponse<AssignmentResponse>> {
    let assignment = state.assignment_service.submit(&user, req).await?;
    Ok(ApiResponse::ok(assignment.into()))
}

/// Show assignment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowAssignmentRequest {
    pub assignment_id: String,
}

/// Fetch one assignment.
async fn show_assignment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowAssignmentRequest>,
) -> AppResult<ApiResponse<AssignmentResponse>> {
    let assignment = state
        .assignment_service
        .get(&user, &req.assignment_id)
        .await?;
    Ok(ApiResponse::ok(assignment.into()))
}

/// Analyze request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub assignment_id: String,
}

/// Analysis response: the updated assignment plus the pricing decision.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub assignment: AssignmentResponse,
    pub analysis: PricingDecision,
}

/// Price an assignment: `pending` through `analyzing` to
/// `analyzed`/`rejected`.
async fn analyze_assignment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> AppResult<ApiResponse<AnalyzeResponse>> {
    let (assignment, analysis) = state
        .assignment_service
        .analyze(&user, &req.assignment_id)
        .await?;

    Ok(ApiResponse::ok(AnalyzeResponse {
        assignment: assignment.into(),
        analysis,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(list_assignments))
        .route("/create", post(create_assignment))
        .route("/show", post(show_assignment))
        .route("/analyze", post(analyze_assignment))
}
