//! Assignment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Assignment lifecycle status.
///
/// `completed` and `rejected` are terminal; nothing leaves them except an
/// explicit privileged override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum AssignmentStatus {
    /// Submitted, not yet priced.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Pricing evaluation in progress.
    #[sea_orm(string_value = "analyzing")]
    Analyzing,
    /// Priced and awaiting payment.
    #[sea_orm(string_value = "analyzed")]
    Analyzed,
    /// Marked paid by an operator.
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Payment confirmed; work queued for fulfillment.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Fulfilled and delivered.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Out of scope or declined.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl AssignmentStatus {
    /// Terminal states admit no further automatic transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// Denormalized owner name for admin tables
    #[sea_orm(nullable)]
    pub user_name: Option<String>,

    #[sea_orm(nullable)]
    pub user_email: Option<String>,

    /// Essay / Research Paper / Project / ... / Other
    pub assignment_type: String,

    pub course_name: String,

    pub class_name: String,

    pub teacher_name: String,

    pub due_date: DateTimeWithTimeZone,

    /// Delivery platform the student wants to be contacted on
    pub platform: String,

    pub platform_contact: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Attached file references: `[{name, size, contentType, url?, uploadError?}]`.
    /// The binaries themselves live in an external object store.
    #[sea_orm(column_type = "JsonBinary")]
    pub files: Json,

    pub status: AssignmentStatus,

    /// Quoted price, set by the pricing engine or an admin override
    #[sea_orm(column_type = "Double", nullable)]
    pub payment_amount: Option<f64>,

    #[sea_orm(nullable)]
    pub payment_currency: Option<String>,

    #[sea_orm(nullable)]
    pub complexity: Option<String>,

    #[sea_orm(nullable)]
    pub estimated_hours: Option<i32>,

    /// The settling payment. Sole authoritative link; abandoned duplicate
    /// intents are ignored by reconciliation.
    #[sea_orm(nullable)]
    pub payment_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
