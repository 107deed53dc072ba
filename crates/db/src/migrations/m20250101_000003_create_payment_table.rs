//! Create payment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Payment::AssignmentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payment::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Payment::Amount).double().not_null())
                    .col(ColumnDef::new(Payment::Currency).string_len(8).not_null())
                    .col(ColumnDef::new(Payment::Provider).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Payment::TransactionReference)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payment::ProviderTransactionId).string_len(128))
                    .col(
                        ColumnDef::new(Payment::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Payment::Metadata).json_binary())
                    .col(
                        ColumnDef::new(Payment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Payment::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_assignment")
                            .from(Payment::Table, Payment::AssignmentId)
                            .to(Assignment::Table, Assignment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_user")
                            .from(Payment::Table, Payment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: transaction_reference (verification join key)
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_transaction_reference")
                    .table(Payment::Table)
                    .col(Payment::TransactionReference)
                    .to_owned(),
            )
            .await?;

        // Index: assignment_id (reconciliation lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_assignment_id")
                    .table(Payment::Table)
                    .col(Payment::AssignmentId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) (admin listing and stats)
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_status_created_at")
                    .table(Payment::Table)
                    .col(Payment::Status)
                    .col(Payment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Payment {
    Table,
    Id,
    AssignmentId,
    UserId,
    Amount,
    Currency,
    Provider,
    TransactionReference,
    ProviderTransactionId,
    Status,
    Metadata,
    CreatedAt,
    CompletedAt,
}

#[derive(Iden)]
enum Assignment {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
