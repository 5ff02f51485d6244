use sea_orm_migration::{prelude::*, schema::*};

use super::m20250601_000001_create_users_table::Users;
use super::m20250601_000002_create_posts_table::Post;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reaction::Table)
                    .col(pk_uuid(Reaction::Id))
                    .col(uuid(Reaction::PostId))
                    .col(uuid(Reaction::UserId))
                    .col(string(Reaction::Kind))
                    .col(string(Reaction::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reaction-post_id")
                            .from(Reaction::Table, Reaction::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reaction-user_id")
                            .from(Reaction::Table, Reaction::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (post, user, type)
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_post_user_kind")
                    .table(Reaction::Table)
                    .col(Reaction::PostId)
                    .col(Reaction::UserId)
                    .col(Reaction::Kind)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reaction::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Reaction {
    Table,
    Id,
    PostId,
    UserId,
    Kind,
    CreatedAt,
}
