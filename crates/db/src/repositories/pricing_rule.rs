//! Pricing rule repository.

use std::sync::Arc;

use crate::entities::{PricingRule, pricing_rule};
use academy_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

/// Pricing rule repository. Read-only from the engine's perspective;
/// rules are managed by operators outside this core.
#[derive(Clone)]
pub struct PricingRuleRepository {
    db: Arc<DatabaseConnection>,
}

impl PricingRuleRepository {
    /// Create a new pricing rule repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List all rules, newest first. Newest-first matters: when an
    /// operator adds a replacement rule, the engine's first-match lookup
    /// picks it up without deleting the old row.
    pub async fn list(&self) -> AppResult<Vec<pricing_rule::Model>> {
        PricingRule::find()
            .order_by_desc(pricing_rule::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
