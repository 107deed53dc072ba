//! Create assignment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Assignment::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignment::UserName).string_len(256))
                    .col(ColumnDef::new(Assignment::UserEmail).string_len(320))
                    .col(
                        ColumnDef::new(Assignment::AssignmentType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::CourseName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::ClassName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::TeacherName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::DueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::Platform)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::PlatformContact)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignment::Description).text())
                    .col(
                        ColumnDef::new(Assignment::Files)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Assignment::PaymentAmount).double())
                    .col(ColumnDef::new(Assignment::PaymentCurrency).string_len(8))
                    .col(ColumnDef::new(Assignment::Complexity).string_len(16))
                    .col(ColumnDef::new(Assignment::EstimatedHours).integer())
                    .col(ColumnDef::new(Assignment::PaymentId).string_len(32))
                    .col(
                        ColumnDef::new(Assignment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Assignment::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_user")
                            .from(Assignment::Table, Assignment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (student's own listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_user_id")
                    .table(Assignment::Table)
                    .col(Assignment::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: status (admin filtering and stats)
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_status")
                    .table(Assignment::Table)
                    .col(Assignment::Status)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_created_at")
                    .table(Assignment::Table)
                    .col(Assignment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assignment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Assignment {
    Table,
    Id,
    UserId,
    UserName,
    UserEmail,
    AssignmentType,
    CourseName,
    ClassName,
    TeacherName,
    DueDate,
    Platform,
    PlatformContact,
    Description,
    Files,
    Status,
    PaymentAmount,
    PaymentCurrency,
    Complexity,
    EstimatedHours,
    PaymentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
