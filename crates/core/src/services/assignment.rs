//! Assignment submission and analysis flow.
//!
//! Submission creates the `pending` record; analysis drives it through the
//! lifecycle: begin pricing, evaluate against the rule table, persist the
//! decision. A pricing failure reverts to `pending` so the student can
//! resubmit.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use academy_common::{AppError, AppResult, IdGenerator};
use academy_db::entities::{assignment, user};
use academy_db::repositories::{AssignmentFilter, AssignmentRepository, UserRepository};

use crate::services::activity_log::{ActivityLogService, ActivityType, NewActivity};
use crate::services::lifecycle::LifecycleService;
use crate::services::pricing::{PricingDecision, PricingInput, PricingService};

pub use academy_db::entities::assignment::AssignmentStatus;

/// A file reference attached to a submission. The binary itself lives in
/// an external object store; only metadata is kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub name: String,
    pub size: i64,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Set when the upload to the object store failed; the submission
    /// still goes through and operators follow up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_error: Option<String>,
}

/// Input for submitting an assignment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAssignmentInput {
    #[validate(length(min = 1, max = 64))]
    pub assignment_type: String,
    #[validate(length(min = 1, max = 256))]
    pub course_name: String,
    #[validate(length(min = 1, max = 256))]
    pub class_name: String,
    #[validate(length(min = 1, max = 256))]
    pub teacher_name: String,
    pub due_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 64))]
    pub platform: String,
    #[validate(length(min = 1, max = 256))]
    pub platform_contact: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// Service for submitting and analyzing assignments.
#[derive(Clone)]
pub struct AssignmentService {
    assignment_repo: AssignmentRepository,
    user_repo: UserRepository,
    lifecycle: LifecycleService,
    pricing: PricingService,
    activity_log: ActivityLogService,
    id_gen: IdGenerator,
}

impl AssignmentService {
    /// Create a new assignment service.
    #[must_use]
    pub const fn new(
        assignment_repo: AssignmentRepository,
        user_repo: UserRepository,
        lifecycle: LifecycleService,
        pricing: PricingService,
        activity_log: ActivityLogService,
    ) -> Self {
        Self {
            assignment_repo,
            user_repo,
            lifecycle,
            pricing,
            activity_log,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new assignment in `pending`.
    pub async fn submit(
        &self,
        user: &user::Model,
        input: SubmitAssignmentInput,
    ) -> AppResult<assignment::Model> {
        input.validate()?;

        let files = serde_json::to_value(&input.files)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let model = assignment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            user_name: Set(Some(user.name.clone())),
            user_email: Set(Some(user.email.clone())),
            assignment_type: Set(input.assignment_type.clone()),
            course_name: Set(input.course_name.clone()),
            class_name: Set(input.class_name),
            teacher_name: Set(input.teacher_name),
            due_date: Set(input.due_date.into()),
            platform: Set(input.platform),
            platform_contact: Set(input.platform_contact),
            description: Set(input.description),
            files: Set(files),
            status: Set(AssignmentStatus::Pending),
            payment_amount: Set(None),
            payment_currency: Set(None),
            complexity: Set(None),
            estimated_hours: Set(None),
            payment_id: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.assignment_repo.create(model).await?;

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::AssignmentCreated,
                    format!(
                        "Assignment created: {} ({})",
                        input.course_name, input.assignment_type
                    ),
                )
                .user(&user.id)
                .assignment(&created.id),
            )
            .await?;

        Ok(created)
    }

    /// Run the pricing flow for an assignment: `pending` to `analyzing`,
    /// evaluate, then `analyzed` or `rejected`. A rule-table failure
    /// reverts to `pending`.
    pub async fn analyze(
        &self,
        actor: &user::Model,
        assignment_id: &str,
    ) -> AppResult<(assignment::Model, PricingDecision)> {
        let assignment = self.get(actor, assignment_id).await?;

        self.lifecycle.start_pricing(&assignment.id).await?;

        // School level comes from the owner's profile, not the actor's
        let owner = self.user_repo.get_by_id(&assignment.user_id).await?;

        let input = PricingInput {
            assignment_type: assignment.assignment_type.clone(),
            description: assignment.description.clone(),
            due_date: Some(assignment.due_date.into()),
            school_level: owner.school_level,
        };

        let decision = match self.pricing.quote(&input).await {
            Ok(decision) => decision,
            Err(e) => {
                self.lifecycle.revert_pricing(&assignment.id).await?;
                return Err(e);
            }
        };

        let updated = self
            .lifecycle
            .apply_pricing_result(&assignment.id, &decision)
            .await?;

        Ok((updated, decision))
    }

    /// Fetch one assignment, visible to its owner and to admins.
    pub async fn get(
        &self,
        actor: &user::Model,
        assignment_id: &str,
    ) -> AppResult<assignment::Model> {
        let assignment = self.assignment_repo.get_by_id(assignment_id).await?;
        if assignment.user_id != actor.id && !actor.is_admin() {
            // Indistinguishable from absent for other users
            return Err(AppError::AssignmentNotFound(assignment_id.to_string()));
        }
        Ok(assignment)
    }

    /// List the actor's own assignments, newest first.
    pub async fn list_own(&self, actor: &user::Model) -> AppResult<Vec<assignment::Model>> {
        self.assignment_repo.find_by_user(&actor.id).await
    }

    /// Admin listing with filters; returns rows plus the unpaginated count.
    pub async fn list_all(
        &self,
        actor: &user::Model,
        filter: &AssignmentFilter,
    ) -> AppResult<(Vec<assignment::Model>, u64)> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("admin only".to_string()));
        }
        self.assignment_repo.list(filter).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use academy_db::repositories::{ActivityLogRepository, PaymentRepository, PricingRuleRepository};
    use crate::services::pricing::PricingEngine;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> AssignmentService {
        let activity_log = ActivityLogService::new(ActivityLogRepository::new(Arc::clone(&db)));
        let lifecycle = LifecycleService::new(
            AssignmentRepository::new(Arc::clone(&db)),
            PaymentRepository::new(Arc::clone(&db)),
            activity_log.clone(),
        );
        let pricing = PricingService::new(
            PricingRuleRepository::new(Arc::clone(&db)),
            PricingEngine::new("GBP".to_string()),
        );
        AssignmentService::new(
            AssignmentRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
            lifecycle,
            pricing,
            activity_log,
        )
    }

    fn test_user(id: &str, admin: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            token: None,
            role: if admin {
                user::UserRole::Admin
            } else {
                user::UserRole::User
            },
            region: None,
            country: None,
            school_level: None,
            department: None,
            created_at: Utc::now().into(),
            last_login: None,
        }
    }

    fn test_assignment(owner: &str) -> assignment::Model {
        assignment::Model {
            id: "a1".to_string(),
            user_id: owner.to_string(),
            user_name: None,
            user_email: None,
            assignment_type: "Essay".to_string(),
            course_name: "History".to_string(),
            class_name: "HIST-101".to_string(),
            teacher_name: "Dr. Jones".to_string(),
            due_date: Utc::now().into(),
            platform: "email".to_string(),
            platform_contact: "alice@example.com".to_string(),
            description: None,
            files: serde_json::json!([]),
            status: AssignmentStatus::Pending,
            payment_amount: None,
            payment_currency: None,
            complexity: None,
            estimated_hours: None,
            payment_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn submit_input_requires_fields() {
        let input = SubmitAssignmentInput {
            assignment_type: String::new(),
            course_name: "History".to_string(),
            class_name: "HIST-101".to_string(),
            teacher_name: "Dr. Jones".to_string(),
            due_date: Utc::now(),
            platform: "email".to_string(),
            platform_contact: "alice@example.com".to_string(),
            description: None,
            files: Vec::new(),
        };

        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn get_hides_foreign_assignments() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_assignment("someone-else")]])
                .into_connection(),
        );

        let result = service(db).get(&test_user("user1", false), "a1").await;

        assert!(matches!(result, Err(AppError::AssignmentNotFound(_))));
    }

    #[tokio::test]
    async fn get_allows_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_assignment("someone-else")]])
                .into_connection(),
        );

        let result = service(db).get(&test_user("admin", true), "a1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn list_all_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(db)
            .list_all(&test_user("user1", false), &AssignmentFilter::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
