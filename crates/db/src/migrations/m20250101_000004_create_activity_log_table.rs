//! Create activity log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityLog::EventType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityLog::UserId).string_len(32))
                    .col(ColumnDef::new(ActivityLog::UserName).string_len(256))
                    .col(ColumnDef::new(ActivityLog::UserEmail).string_len(320))
                    .col(ColumnDef::new(ActivityLog::AssignmentId).string_len(32))
                    .col(ColumnDef::new(ActivityLog::PaymentId).string_len(32))
                    .col(ColumnDef::new(ActivityLog::Description).text().not_null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // No foreign keys: log rows are weak references and must outlive
        // the entities they mention.

        // Index: created_at (reverse-chronological listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_log_created_at")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: assignment_id (per-assignment trail)
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_log_assignment_id")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::AssignmentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityLog {
    Table,
    Id,
    EventType,
    UserId,
    UserName,
    UserEmail,
    AssignmentId,
    PaymentId,
    Description,
    CreatedAt,
}
