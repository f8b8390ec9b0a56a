//! Migration: Create contest_submissions table.
//!
//! The unique (user_id, problem_title) index backs the submission upsert.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContestSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContestSubmissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContestSubmissions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ContestSubmissions::ProblemTitle)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::ProblemDescription)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::Difficulty)
                            .string_len(50)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::Topic)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::Language)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContestSubmissions::Code).text().not_null())
                    .col(
                        ColumnDef::new(ContestSubmissions::Solved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::Attempts)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::LastAttemptedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::SolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::TestCases)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContestSubmissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contest_submissions_user_id")
                            .from(ContestSubmissions::Table, ContestSubmissions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contest_submissions_user_problem")
                    .table(ContestSubmissions::Table)
                    .col(ContestSubmissions::UserId)
                    .col(ContestSubmissions::ProblemTitle)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Leaderboard filter
        manager
            .create_index(
                Index::create()
                    .name("idx_contest_submissions_difficulty")
                    .table(ContestSubmissions::Table)
                    .col(ContestSubmissions::Difficulty)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ContestSubmissions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ContestSubmissions {
    Table,
    Id,
    UserId,
    ProblemTitle,
    ProblemDescription,
    Difficulty,
    Topic,
    Language,
    Code,
    Solved,
    Attempts,
    LastAttemptedAt,
    SolvedAt,
    TestCases,
    CreatedAt,
    UpdatedAt,
}
