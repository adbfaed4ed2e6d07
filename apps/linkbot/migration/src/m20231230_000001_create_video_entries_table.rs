use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoEntries::ContentType).string_len(255).not_null())
                    .col(ColumnDef::new(VideoEntries::Width).integer())
                    .col(ColumnDef::new(VideoEntries::Height).integer())
                    .col(ColumnDef::new(VideoEntries::Url).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VideoEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum VideoEntries {
    Table,
    Id,
    ContentType,
    Width,
    Height,
    Url,
}
