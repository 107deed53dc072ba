//! Pricing rule entity.
//!
//! Admin-managed hourly rates keyed by (complexity, assignment type). The
//! pricing engine treats this table as read-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Complexity tiers produced by the pricing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "camelCase")]
pub enum Complexity {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

impl Complexity {
    /// Stable string form, matching the stored column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pricing_rule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub complexity: Complexity,

    /// Assignment type the rule applies to, or "default" for the
    /// complexity-wide rate
    pub assignment_type: String,

    #[sea_orm(column_type = "Double")]
    pub hourly_rate: f64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
