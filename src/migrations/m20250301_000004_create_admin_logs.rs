//! Migration: Create admin_logs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminLogs::AdminId).big_integer().not_null())
                    .col(ColumnDef::new(AdminLogs::Action).string().not_null())
                    .col(ColumnDef::new(AdminLogs::TargetUserId).big_integer().null())
                    .col(ColumnDef::new(AdminLogs::TargetCampaignId).string().null())
                    .col(ColumnDef::new(AdminLogs::Details).text().null())
                    .col(
                        ColumnDef::new(AdminLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_logs_created_at")
                    .table(AdminLogs::Table)
                    .col(AdminLogs::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_logs_admin_id")
                    .table(AdminLogs::Table)
                    .col(AdminLogs::AdminId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminLogs::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "admin_logs"]
enum AdminLogs {
    Table,
    Id,
    #[iden = "admin_id"]
    AdminId,
    Action,
    #[iden = "target_user_id"]
    TargetUserId,
    #[iden = "target_campaign_id"]
    TargetCampaignId,
    Details,
    #[iden = "created_at"]
    CreatedAt,
}
