//! Create users table.
//!
//! Usernames are unique per account, not globally.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users_table()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_account_username")
                    .table(Users::Table)
                    .col(Users::AccountId)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_account_id")
                    .table(Users::Table)
                    .col(Users::AccountId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

/// `metadata` is plain `json` so PostgreSQL keeps the client's key order; `jsonb` would not.
fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Users::AccountId).uuid().not_null())
        .col(ColumnDef::new(Users::Username).string().not_null())
        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
        .col(ColumnDef::new(Users::Role).string().not_null().default(""))
        .col(ColumnDef::new(Users::Metadata).json())
        .col(
            ColumnDef::new(Users::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Users::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_users_account_id")
                .from(Users::Table, Users::AccountId)
                .to(Accounts::Table, Accounts::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden)]
pub(super) enum Users {
    Table,
    Id,
    AccountId,
    Username,
    PasswordHash,
    Role,
    Metadata,
    CreatedAt,
    UpdatedAt,
}
