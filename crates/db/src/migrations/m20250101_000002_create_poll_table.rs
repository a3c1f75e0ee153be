//! Create poll table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Poll::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Poll::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Poll::Description).text())
                    .col(ColumnDef::new(Poll::CreatorId).integer().not_null())
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Poll::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_creator")
                            .from(Poll::Table, Poll::CreatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: creator_id (for ownership lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_creator_id")
                    .table(Poll::Table)
                    .col(Poll::CreatorId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for listing newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_created_at")
                    .table(Poll::Table)
                    .col(Poll::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
    Title,
    Description,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
