//! Activity log entity.
//!
//! Append-only. Rows are inserted on every real state transition and user
//! action, and are never updated or deleted in normal operation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Activity event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "user_registered")]
    UserRegistered,
    #[sea_orm(string_value = "user_login")]
    UserLogin,
    #[sea_orm(string_value = "user_updated")]
    UserUpdated,
    #[sea_orm(string_value = "assignment_created")]
    AssignmentCreated,
    #[sea_orm(string_value = "assignment_analyzing")]
    AssignmentAnalyzing,
    #[sea_orm(string_value = "assignment_analyzed")]
    AssignmentAnalyzed,
    #[sea_orm(string_value = "assignment_paid")]
    AssignmentPaid,
    #[sea_orm(string_value = "assignment_submitted")]
    AssignmentSubmitted,
    #[sea_orm(string_value = "assignment_completed")]
    AssignmentCompleted,
    #[sea_orm(string_value = "assignment_rejected")]
    AssignmentRejected,
    #[sea_orm(string_value = "payment_initiated")]
    PaymentInitiated,
    #[sea_orm(string_value = "payment_completed")]
    PaymentCompleted,
    #[sea_orm(string_value = "payment_failed")]
    PaymentFailed,
    /// Verification polling hit its cap with the payment still pending.
    /// Kept separate from `payment_failed`: the money may still arrive.
    #[sea_orm(string_value = "payment_timeout")]
    PaymentTimeout,
    #[sea_orm(string_value = "payment_refunded")]
    PaymentRefunded,
    #[sea_orm(string_value = "admin_action")]
    AdminAction,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub event_type: ActivityType,

    /// Acting user, absent for system-driven events
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    #[sea_orm(nullable)]
    pub user_name: Option<String>,

    #[sea_orm(nullable)]
    pub user_email: Option<String>,

    /// Related assignment (weak reference, lookup only)
    #[sea_orm(nullable)]
    pub assignment_id: Option<String>,

    #[sea_orm(nullable)]
    pub payment_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
