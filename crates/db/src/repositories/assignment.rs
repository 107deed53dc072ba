//! Assignment repository.

use std::sync::Arc;

use crate::entities::{Assignment, assignment};
use academy_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use assignment::AssignmentStatus;

/// Filters for the admin assignment listing.
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    /// Restrict to a single status.
    pub status: Option<AssignmentStatus>,
    /// Case-insensitive substring over course name, owner name and email.
    pub search: Option<String>,
    /// Page size.
    pub limit: Option<u64>,
    /// Page offset.
    pub offset: Option<u64>,
}

/// Assignment repository for database operations.
#[derive(Clone)]
pub struct AssignmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AssignmentRepository {
    /// Create a new assignment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an assignment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<assignment::Model>> {
        Assignment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an assignment by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<assignment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AssignmentNotFound(id.to_string()))
    }

    /// Create a new assignment.
    pub async fn create(&self, model: assignment::ActiveModel) -> AppResult<assignment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an unconditional update. Admin override path only; lifecycle
    /// transitions go through [`Self::update_if_status`].
    pub async fn update(&self, model: assignment::ActiveModel) -> AppResult<assignment::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Conditionally apply an update only if the assignment currently has
    /// the expected status.
    ///
    /// This is the compare-and-swap all lifecycle transitions are built on:
    /// of two concurrent attempts at the same transition, exactly one
    /// observes `true`. Returns `false` when the row exists but the status
    /// no longer matches (or the row is gone); callers decide between
    /// no-op and `InvalidTransition`.
    pub async fn update_if_status(
        &self,
        id: &str,
        expected: AssignmentStatus,
        update: assignment::ActiveModel,
    ) -> AppResult<bool> {
        let result = Assignment::update_many()
            .set(update)
            .filter(assignment::Column::Id.eq(id))
            .filter(assignment::Column::Status.eq(expected))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// List a user's assignments, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<assignment::Model>> {
        Assignment::find()
            .filter(assignment::Column::UserId.eq(user_id))
            .order_by_desc(assignment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List assignments with admin filters, newest first, plus the total
    /// count matching the filter (ignoring pagination).
    pub async fn list(
        &self,
        filter: &AssignmentFilter,
    ) -> AppResult<(Vec<assignment::Model>, u64)> {
        let mut query = Assignment::find().order_by_desc(assignment::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(assignment::Column::Status.eq(status));
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(assignment::Column::CourseName.contains(search))
                    .add(assignment::Column::UserName.contains(search))
                    .add(assignment::Column::UserEmail.contains(search)),
            );
        }

        let count = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }

        let rows = query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((rows, count))
    }

    /// Count all assignments.
    pub async fn count(&self) -> AppResult<u64> {
        Assignment::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count assignments in a given status.
    pub async fn count_by_status(&self, status: AssignmentStatus) -> AppResult<u64> {
        Assignment::find()
            .filter(assignment::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count assignments created at or after the given instant.
    pub async fn count_created_since(
        &self,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<u64> {
        Assignment::find()
            .filter(assignment::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
