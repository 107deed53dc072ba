//! Activity log service.
//!
//! Append-only trail of state transitions and user actions, consumed by
//! the admin surface and by payment reconciliation for traceability.

use academy_common::{AppResult, IdGenerator};
use academy_db::entities::activity_log;
use academy_db::repositories::ActivityLogRepository;
use sea_orm::Set;

pub use academy_db::entities::activity_log::ActivityType;

/// Default cap for log listings.
const DEFAULT_LIMIT: u64 = 100;

/// One fact to append.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub event_type: ActivityType,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub assignment_id: Option<String>,
    pub payment_id: Option<String>,
    pub description: String,
}

impl NewActivity {
    /// Start an entry of the given kind.
    #[must_use]
    pub fn new(event_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            event_type,
            user_id: None,
            user_name: None,
            user_email: None,
            assignment_id: None,
            payment_id: None,
            description: description.into(),
        }
    }

    /// Attach the acting user.
    #[must_use]
    pub fn user(mut self, id: &str) -> Self {
        self.user_id = Some(id.to_string());
        self
    }

    /// Attach the related assignment.
    #[must_use]
    pub fn assignment(mut self, id: &str) -> Self {
        self.assignment_id = Some(id.to_string());
        self
    }

    /// Attach the related payment.
    #[must_use]
    pub fn payment(mut self, id: &str) -> Self {
        self.payment_id = Some(id.to_string());
        self
    }
}

/// Service for recording and listing activity.
#[derive(Clone)]
pub struct ActivityLogService {
    log_repo: ActivityLogRepository,
    id_gen: IdGenerator,
}

impl ActivityLogService {
    /// Create a new activity log service.
    #[must_use]
    pub const fn new(log_repo: ActivityLogRepository) -> Self {
        Self {
            log_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an entry. Prior entries are never mutated or deleted.
    pub async fn record(&self, entry: NewActivity) -> AppResult<activity_log::Model> {
        let model = activity_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_type: Set(entry.event_type),
            user_id: Set(entry.user_id),
            user_name: Set(entry.user_name),
            user_email: Set(entry.user_email),
            assignment_id: Set(entry.assignment_id),
            payment_id: Set(entry.payment_id),
            description: Set(entry.description),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.log_repo.create(model).await
    }

    /// List entries, newest first.
    pub async fn list(&self, limit: Option<u64>) -> AppResult<Vec<activity_log::Model>> {
        self.log_repo
            .list(limit.unwrap_or(DEFAULT_LIMIT))
            .await
    }

    /// List entries for one assignment, newest first.
    pub async fn list_for_assignment(
        &self,
        assignment_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<activity_log::Model>> {
        self.log_repo
            .list_for_assignment(assignment_id, limit.unwrap_or(DEFAULT_LIMIT))
            .await
    }

    /// List entries for one user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<activity_log::Model>> {
        self.log_repo
            .list_for_user(user_id, limit.unwrap_or(DEFAULT_LIMIT))
            .await
    }
}
