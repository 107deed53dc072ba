//! Payment repository.

use std::sync::Arc;

use crate::entities::{Payment, payment};
use academy_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use payment::PaymentStatus;

/// Payment repository for database operations.
#[derive(Clone)]
pub struct PaymentRepository {
    db: Arc<DatabaseConnection>,
}

impl PaymentRepository {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a payment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<payment::Model>> {
        Payment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a payment by its transaction reference.
    pub async fn find_by_reference(&self, tx_ref: &str) -> AppResult<Option<payment::Model>> {
        Payment::find()
            .filter(payment::Column::TransactionReference.eq(tx_ref))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a payment by its transaction reference, failing if absent.
    pub async fn get_by_reference(&self, tx_ref: &str) -> AppResult<payment::Model> {
        self.find_by_reference(tx_ref)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(tx_ref.to_string()))
    }

    /// Create a new payment row.
    pub async fn create(&self, model: payment::ActiveModel) -> AppResult<payment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Conditionally apply an update only if the payment currently has the
    /// expected status. Keeps status transitions monotonic under
    /// overlapping verification polls: the losing poll affects zero rows.
    pub async fn update_if_status(
        &self,
        id: &str,
        expected: PaymentStatus,
        update: payment::ActiveModel,
    ) -> AppResult<bool> {
        let result = Payment::update_many()
            .set(update)
            .filter(payment::Column::Id.eq(id))
            .filter(payment::Column::Status.eq(expected))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// List payments for an assignment, newest first.
    pub async fn find_by_assignment(&self, assignment_id: &str) -> AppResult<Vec<payment::Model>> {
        Payment::find()
            .filter(payment::Column::AssignmentId.eq(assignment_id))
            .order_by_desc(payment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List payments, newest first, optionally restricted to a status.
    pub async fn list(
        &self,
        status: Option<PaymentStatus>,
        limit: u64,
    ) -> AppResult<Vec<payment::Model>> {
        let mut query = Payment::find().order_by_desc(payment::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(payment::Column::Status.eq(status));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count payments in a given status.
    pub async fn count_by_status(&self, status: PaymentStatus) -> AppResult<u64> {
        Payment::find()
            .filter(payment::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of completed payment amounts, optionally bounded below by a
    /// creation instant.
    pub async fn sum_completed(
        &self,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> AppResult<f64> {
        let mut query = Payment::find().filter(payment::Column::Status.eq(PaymentStatus::Completed));

        if let Some(since) = since {
            query = query.filter(payment::Column::CreatedAt.gte(since));
        }

        let rows = query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.iter().map(|p| p.amount).sum())
    }
}
