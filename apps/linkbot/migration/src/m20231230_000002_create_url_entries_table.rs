use sea_orm_migration::prelude::*;

use crate::m20231230_000001_create_video_entries_table::VideoEntries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UrlEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UrlEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UrlEntries::ChannelId).big_integer().not_null())
                    .col(ColumnDef::new(UrlEntries::MessageId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UrlEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(UrlEntries::Who).string_len(255).not_null())
                    .col(ColumnDef::new(UrlEntries::WhoId).big_integer().not_null())
                    .col(ColumnDef::new(UrlEntries::Url).text().not_null())
                    .col(ColumnDef::new(UrlEntries::Message).text().not_null())
                    .col(ColumnDef::new(UrlEntries::OgSite).text())
                    .col(ColumnDef::new(UrlEntries::OgTitle).text())
                    .col(ColumnDef::new(UrlEntries::OgImage).text())
                    .col(ColumnDef::new(UrlEntries::OgDescription).text())
                    .col(ColumnDef::new(UrlEntries::VideoId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_url_entries_video_id")
                            .from(UrlEntries::Table, UrlEntries::VideoId)
                            .to(VideoEntries::Table, VideoEntries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_url_entries_channel_id")
                    .table(UrlEntries::Table)
                    .col(UrlEntries::ChannelId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_url_entries_created_at")
                    .table(UrlEntries::Table)
                    .col(UrlEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Per-message lookups
        manager
            .create_index(
                Index::create()
                    .name("ix_url_entries_channel_id_message_id")
                    .table(UrlEntries::Table)
                    .col(UrlEntries::ChannelId)
                    .col(UrlEntries::MessageId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UrlEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UrlEntries {
    Table,
    Id,
    ChannelId,
    MessageId,
    CreatedAt,
    Who,
    WhoId,
    Url,
    Message,
    OgSite,
    OgTitle,
    OgImage,
    OgDescription,
    VideoId,
}
