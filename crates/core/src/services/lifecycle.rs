//! Assignment lifecycle state machine.
//!
//! Owns the assignment status field. Every transition is encoded in
//! [`transition`] and applied through a conditional update on the current
//! status, so concurrent attempts (stale tabs, double submits) resolve to
//! at most one real transition; the loser observes a no-op or an
//! `InvalidTransition`, never a split state. Each real transition appends
//! exactly one activity log entry; no-ops append nothing.

use academy_common::{AppError, AppResult};
use academy_db::entities::{assignment, user};
use academy_db::repositories::{AssignmentRepository, PaymentRepository};
use sea_orm::Set;

use crate::services::activity_log::{ActivityLogService, ActivityType, NewActivity};
use crate::services::pricing::PricingDecision;

pub use academy_db::entities::assignment::AssignmentStatus;
pub use academy_db::entities::payment::PaymentStatus;

/// Events that drive automatic status transitions. Operator overrides go
/// through [`LifecycleService::admin_set_status`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Pricing evaluation started.
    BeginPricing,
    /// The engine accepted the assignment.
    PricingInScope,
    /// The engine rejected the assignment.
    PricingOutOfScope,
    /// Pricing could not complete; resubmission stays possible.
    PricingFailed,
    /// The linked payment settled.
    PaymentConfirmed,
}

/// The transition table. Returns the next status, or `None` when the event
/// is not legal in the given state.
#[must_use]
pub const fn transition(from: AssignmentStatus, event: LifecycleEvent) -> Option<AssignmentStatus> {
    use AssignmentStatus::{Analyzed, Analyzing, Pending, Rejected, Submitted};
    use LifecycleEvent::{
        BeginPricing, PaymentConfirmed, PricingFailed, PricingInScope, PricingOutOfScope,
    };

    match (from, event) {
        (Pending, BeginPricing) => Some(Analyzing),
        (Analyzing, PricingInScope) => Some(Analyzed),
        (Analyzing, PricingOutOfScope) => Some(Rejected),
        (Analyzing, PricingFailed) => Some(Pending),
        (Analyzed, PaymentConfirmed) => Some(Submitted),
        _ => None,
    }
}

/// Input for a privileged status override.
#[derive(Debug, Clone)]
pub struct AdminSetStatusInput {
    pub assignment_id: String,
    pub status: AssignmentStatus,
    /// Optional price override.
    pub payment_amount: Option<f64>,
    pub note: Option<String>,
}

/// Service enforcing the assignment lifecycle.
#[derive(Clone)]
pub struct LifecycleService {
    assignment_repo: AssignmentRepository,
    payment_repo: PaymentRepository,
    activity_log: ActivityLogService,
}

impl LifecycleService {
    /// Create a new lifecycle service.
    #[must_use]
    pub const fn new(
        assignment_repo: AssignmentRepository,
        payment_repo: PaymentRepository,
        activity_log: ActivityLogService,
    ) -> Self {
        Self {
            assignment_repo,
            payment_repo,
            activity_log,
        }
    }

    /// Move an assignment into pricing evaluation.
    ///
    /// Repeating the call while pricing is already underway is a no-op.
    pub async fn start_pricing(&self, assignment_id: &str) -> AppResult<assignment::Model> {
        let current = self.assignment_repo.get_by_id(assignment_id).await?;

        let Some(to) = transition(current.status, LifecycleEvent::BeginPricing) else {
            if current.status == AssignmentStatus::Analyzing {
                return Ok(current);
            }
            return Err(invalid(current.status, "begin pricing"));
        };

        if !self.swap(&current, to, assignment::ActiveModel::default()).await? {
            return self.resolve_lost_race(assignment_id, to, "begin pricing").await;
        }

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::AssignmentAnalyzing,
                    format!("Review started for assignment {assignment_id}"),
                )
                .user(&current.user_id)
                .assignment(assignment_id),
            )
            .await?;

        self.assignment_repo.get_by_id(assignment_id).await
    }

    /// Persist a pricing decision, advancing to `analyzed` or `rejected`.
    ///
    /// Price, complexity and hours are written only here (or via an
    /// explicit admin override); re-applying an identical terminal
    /// decision is a no-op.
    pub async fn apply_pricing_result(
        &self,
        assignment_id: &str,
        decision: &PricingDecision,
    ) -> AppResult<assignment::Model> {
        let current = self.assignment_repo.get_by_id(assignment_id).await?;

        let (event, log) = if decision.in_scope {
            (
                LifecycleEvent::PricingInScope,
                NewActivity::new(
                    ActivityType::AssignmentAnalyzed,
                    format!(
                        "Review complete. Price: {:.2} {}. Complexity: {}",
                        decision.price,
                        decision.currency,
                        decision.complexity.as_str()
                    ),
                ),
            )
        } else {
            (
                LifecycleEvent::PricingOutOfScope,
                NewActivity::new(
                    ActivityType::AssignmentRejected,
                    format!(
                        "Assignment rejected: {}",
                        decision.reason.as_deref().unwrap_or("out of scope")
                    ),
                ),
            )
        };

        let Some(to) = transition(current.status, event) else {
            // Re-applying the same outcome is a no-op
            let repeat = (decision.in_scope && current.status == AssignmentStatus::Analyzed)
                || (!decision.in_scope && current.status == AssignmentStatus::Rejected);
            if repeat {
                return Ok(current);
            }
            return Err(invalid(current.status, "apply pricing result"));
        };

        let mut update = assignment::ActiveModel::default();
        if decision.in_scope {
            update.payment_amount = Set(Some(decision.price));
            update.payment_currency = Set(Some(decision.currency.clone()));
            update.complexity = Set(Some(decision.complexity.as_str().to_string()));
            update.estimated_hours = Set(Some(decision.estimated_hours));
        }

        if !self.swap(&current, to, update).await? {
            return self
                .resolve_lost_race(assignment_id, to, "apply pricing result")
                .await;
        }

        self.activity_log
            .record(log.user(&current.user_id).assignment(assignment_id))
            .await?;

        self.assignment_repo.get_by_id(assignment_id).await
    }

    /// Return an assignment to `pending` after a pricing failure so the
    /// student can resubmit. Not a logged transition: no decision was
    /// produced, and nothing terminal happened.
    pub async fn revert_pricing(&self, assignment_id: &str) -> AppResult<()> {
        let current = self.assignment_repo.get_by_id(assignment_id).await?;

        if let Some(to) = transition(current.status, LifecycleEvent::PricingFailed) {
            // Result deliberately ignored: if another actor moved the
            // assignment on, their transition stands.
            self.swap(&current, to, assignment::ActiveModel::default())
                .await?;
        }
        Ok(())
    }

    /// Advance an assignment to `submitted` once its payment settled.
    ///
    /// Guard: the referenced payment must belong to the assignment and be
    /// `completed`. Re-confirming the already-linked payment is a no-op.
    pub async fn confirm_payment(
        &self,
        assignment_id: &str,
        payment_id: &str,
    ) -> AppResult<assignment::Model> {
        let current = self.assignment_repo.get_by_id(assignment_id).await?;

        // Idempotent repeat of a confirmation that already went through
        if current.status == AssignmentStatus::Submitted
            && current.payment_id.as_deref() == Some(payment_id)
        {
            return Ok(current);
        }

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;

        if payment.assignment_id != current.id {
            return Err(AppError::BadRequest(format!(
                "payment {payment_id} does not belong to assignment {assignment_id}"
            )));
        }

        if payment.status != PaymentStatus::Completed {
            return Err(AppError::InvalidTransition(format!(
                "payment {payment_id} is not completed"
            )));
        }

        let Some(to) = transition(current.status, LifecycleEvent::PaymentConfirmed) else {
            return Err(invalid(current.status, "confirm payment"));
        };

        let update = assignment::ActiveModel {
            payment_id: Set(Some(payment_id.to_string())),
            ..Default::default()
        };

        if !self.swap(&current, to, update).await? {
            let latest = self.assignment_repo.get_by_id(assignment_id).await?;
            if latest.status == to && latest.payment_id.as_deref() == Some(payment_id) {
                return Ok(latest);
            }
            return Err(invalid(latest.status, "confirm payment"));
        }

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::PaymentCompleted,
                    format!("Payment verified. {:.2} {}", payment.amount, payment.currency),
                )
                .user(&payment.user_id)
                .assignment(assignment_id)
                .payment(payment_id),
            )
            .await?;

        self.assignment_repo.get_by_id(assignment_id).await
    }

    /// Privileged status override. The one path that may leave a terminal
    /// state. Setting the status an assignment already has (with no price
    /// override) is a no-op and appends nothing.
    pub async fn admin_set_status(
        &self,
        actor: &user::Model,
        input: AdminSetStatusInput,
    ) -> AppResult<assignment::Model> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("admin only".to_string()));
        }

        let current = self.assignment_repo.get_by_id(&input.assignment_id).await?;

        if current.status == input.status && input.payment_amount.is_none() {
            return Ok(current);
        }

        let mut update = assignment::ActiveModel::default();
        if let Some(amount) = input.payment_amount {
            update.payment_amount = Set(Some(amount));
        }

        if !self.swap(&current, input.status, update).await? {
            let latest = self.assignment_repo.get_by_id(&input.assignment_id).await?;
            if latest.status == input.status && input.payment_amount.is_none() {
                return Ok(latest);
            }
            return Err(AppError::Conflict(
                "assignment changed concurrently".to_string(),
            ));
        }

        let mut description = format!(
            "Admin updated assignment {} -> {}",
            input.assignment_id,
            status_name(input.status)
        );
        if let Some(amount) = input.payment_amount {
            description.push_str(&format!(". Price set to {amount:.2}"));
        }
        if let Some(note) = input.note.as_deref().filter(|n| !n.is_empty()) {
            description.push_str(&format!(". Notes: {note}"));
        }

        self.activity_log
            .record(
                NewActivity::new(ActivityType::AdminAction, description)
                    .user(&actor.id)
                    .assignment(&input.assignment_id),
            )
            .await?;

        self.assignment_repo.get_by_id(&input.assignment_id).await
    }

    /// Compare-and-swap the status, stamping `updated_at`.
    async fn swap(
        &self,
        current: &assignment::Model,
        to: AssignmentStatus,
        mut update: assignment::ActiveModel,
    ) -> AppResult<bool> {
        update.status = Set(to);
        update.updated_at = Set(Some(chrono::Utc::now().into()));
        self.assignment_repo
            .update_if_status(&current.id, current.status, update)
            .await
    }

    /// A lost CAS race against an identical transition is a no-op; against
    /// anything else it surfaces as `InvalidTransition`.
    async fn resolve_lost_race(
        &self,
        assignment_id: &str,
        expected: AssignmentStatus,
        operation: &str,
    ) -> AppResult<assignment::Model> {
        let latest = self.assignment_repo.get_by_id(assignment_id).await?;
        if latest.status == expected {
            return Ok(latest);
        }
        Err(invalid(latest.status, operation))
    }
}

fn invalid(from: AssignmentStatus, operation: &str) -> AppError {
    AppError::InvalidTransition(format!("cannot {operation} from {}", status_name(from)))
}

const fn status_name(status: AssignmentStatus) -> &'static str {
    match status {
        AssignmentStatus::Pending => "pending",
        AssignmentStatus::Analyzing => "analyzing",
        AssignmentStatus::Analyzed => "analyzed",
        AssignmentStatus::Paid => "paid",
        AssignmentStatus::Submitted => "submitted",
        AssignmentStatus::Completed => "completed",
        AssignmentStatus::Rejected => "rejected",
    }
}
