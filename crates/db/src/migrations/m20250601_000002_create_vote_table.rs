//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::VoterId).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::VoterType).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::Type).string_len(8).not_null())
                    .col(ColumnDef::new(Vote::Kind).string_len(64).not_null())
                    .col(ColumnDef::new(Vote::Code).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vote::UndoneAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_poll")
                            .from(Vote::Table, Vote::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (poll_id, kind, code) - the aggregation partition
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_partition")
                    .table(Vote::Table)
                    .col(Vote::PollId)
                    .col(Vote::Kind)
                    .col(Vote::Code)
                    .to_owned(),
            )
            .await?;

        // Index: group key + created_at (for "current vote" lookups).
        // NOT unique: the ledger is append-only and a group accumulates
        // one row per cast.
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_group_created_at")
                    .table(Vote::Table)
                    .col(Vote::PollId)
                    .col(Vote::VoterId)
                    .col(Vote::VoterType)
                    .col(Vote::Kind)
                    .col(Vote::Code)
                    .col(Vote::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    PollId,
    VoterId,
    VoterType,
    Type,
    Kind,
    Code,
    CreatedAt,
    UndoneAt,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}
