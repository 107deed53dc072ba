//! Create pricing rule table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PricingRule::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PricingRule::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PricingRule::Complexity)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PricingRule::AssignmentType)
                            .string_len(64)
                            .not_null()
                            .default("default"),
                    )
                    .col(
                        ColumnDef::new(PricingRule::HourlyRate)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PricingRule::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (complexity, assignment_type) (engine lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_pricing_rule_complexity_type")
                    .table(PricingRule::Table)
                    .col(PricingRule::Complexity)
                    .col(PricingRule::AssignmentType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PricingRule::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PricingRule {
    Table,
    Id,
    Complexity,
    AssignmentType,
    HourlyRate,
    CreatedAt,
}
