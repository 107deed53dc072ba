//! Payment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment status.
///
/// Transitions are monotonic: once a payment reaches `completed`, `failed`
/// or `refunded` it never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    /// Checkout created, settlement not yet observed.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Provider reports the payment in flight.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Declined or expired at the provider.
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Refunded by an operator.
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl PaymentStatus {
    /// Terminal payment states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Refunded)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub assignment_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(column_type = "Double")]
    pub amount: f64,

    pub currency: String,

    /// Provider slug, e.g. "wise"
    pub provider: String,

    /// Locally generated reference embedded in the provider checkout and
    /// used as the join key on return. Unique and immutable.
    #[sea_orm(unique)]
    pub transaction_reference: String,

    /// Provider-side checkout/transfer identifier
    #[sea_orm(nullable)]
    pub provider_transaction_id: Option<String>,

    pub status: PaymentStatus,

    /// Free-form provider metadata, e.g. `{"checkoutUrl": ...}`
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id",
        on_delete = "Cascade"
    )]
    Assignment,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
