//! Create poll option table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollOption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollOption::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollOption::Text).string_len(512).not_null())
                    .col(ColumnDef::new(PollOption::PollId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_option_poll")
                            .from(PollOption::Table, PollOption::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: poll_id (options of a poll)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_option_poll_id")
                    .table(PollOption::Table)
                    .col(PollOption::PollId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PollOption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PollOption {
    Table,
    Id,
    Text,
    PollId,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}
