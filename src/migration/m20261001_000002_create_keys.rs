//! Create keys table (tenant-scoping account keys).

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Keys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Keys::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Keys::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(Keys::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Keys::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_keys_account_id")
                            .from(Keys::Table, Keys::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_keys_account_id")
                    .table(Keys::Table)
                    .col(Keys::AccountId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Keys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Keys {
    Table,
    Id,
    AccountId,
    CreatedAt,
    UpdatedAt,
}
