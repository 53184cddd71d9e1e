//! Migration: Create campaigns and campaign_recipients tables

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Campaigns::SenderId).string().not_null())
                    .col(ColumnDef::new(Campaigns::RecipientCount).integer().not_null())
                    .col(ColumnDef::new(Campaigns::AudioUrl).text().not_null())
                    .col(ColumnDef::new(Campaigns::AudioFormat).string().not_null())
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Campaigns::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Campaigns::GatewayResponse).text().null())
                    .col(ColumnDef::new(Campaigns::CreditsUsed).big_integer().not_null())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaigns_user")
                            .from(Campaigns::Table, Campaigns::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaigns_user_id")
                    .table(Campaigns::Table)
                    .col(Campaigns::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaigns_status")
                    .table(Campaigns::Table)
                    .col(Campaigns::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CampaignRecipients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignRecipients::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::CampaignId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::PhoneNumber)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(CampaignRecipients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_recipients_campaign")
                            .from(CampaignRecipients::Table, CampaignRecipients::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaign_recipients_campaign_id")
                    .table(CampaignRecipients::Table)
                    .col(CampaignRecipients::CampaignId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(CampaignRecipients::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Campaigns {
    Table,
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "sender_id"]
    SenderId,
    #[iden = "recipient_count"]
    RecipientCount,
    #[iden = "audio_url"]
    AudioUrl,
    #[iden = "audio_format"]
    AudioFormat,
    Status,
    Progress,
    #[iden = "gateway_response"]
    GatewayResponse,
    #[iden = "credits_used"]
    CreditsUsed,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "completed_at"]
    CompletedAt,
}

#[derive(Iden)]
#[iden = "campaign_recipients"]
enum CampaignRecipients {
    Table,
    Id,
    #[iden = "campaign_id"]
    CampaignId,
    #[iden = "phone_number"]
    PhoneNumber,
    Status,
    #[iden = "created_at"]
    CreatedAt,
}
