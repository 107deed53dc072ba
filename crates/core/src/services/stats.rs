//! Dashboard statistics for the admin console.

use serde::Serialize;

use academy_common::{AppError, AppResult};
use academy_db::entities::assignment::AssignmentStatus;
use academy_db::entities::payment::PaymentStatus;
use academy_db::entities::user;
use academy_db::repositories::{AssignmentRepository, PaymentRepository, UserRepository};

/// Aggregate counters shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_assignments: u64,
    pub total_revenue: f64,
    pub pending_assignments: u64,
    pub analyzing_assignments: u64,
    pub completed_assignments: u64,
    pub failed_payments: u64,
    pub new_users_today: u64,
    pub assignments_today: u64,
    pub revenue_today: f64,
}

/// Service computing dashboard aggregates.
#[derive(Clone)]
pub struct StatsService {
    user_repo: UserRepository,
    assignment_repo: AssignmentRepository,
    payment_repo: PaymentRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        assignment_repo: AssignmentRepository,
        payment_repo: PaymentRepository,
    ) -> Self {
        Self {
            user_repo,
            assignment_repo,
            payment_repo,
        }
    }

    /// Compute the dashboard aggregates. Revenue counts completed
    /// payments only.
    pub async fn dashboard(&self, actor: &user::Model) -> AppResult<DashboardStats> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("admin only".to_string()));
        }

        let today = chrono::Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        Ok(DashboardStats {
            total_users: self.user_repo.count().await?,
            total_assignments: self.assignment_repo.count().await?,
            total_revenue: self.payment_repo.sum_completed(None).await?,
            pending_assignments: self
                .assignment_repo
                .count_by_status(AssignmentStatus::Pending)
                .await?,
            analyzing_assignments: self
                .assignment_repo
                .count_by_status(AssignmentStatus::Analyzing)
                .await?,
            completed_assignments: self
                .assignment_repo
                .count_by_status(AssignmentStatus::Completed)
                .await?,
            failed_payments: self
                .payment_repo
                .count_by_status(PaymentStatus::Failed)
                .await?,
            new_users_today: self.user_repo.count_created_since(today).await?,
            assignments_today: self.assignment_repo.count_created_since(today).await?,
            revenue_today: self.payment_repo.sum_completed(Some(today)).await?,
        })
    }
}
