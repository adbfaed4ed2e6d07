use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One URL posted in one channel, with whatever preview data could be scraped.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "url_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub channel_id: i64,
    pub message_id: i64,
    pub created_at: DateTime<Utc>,
    pub who: String,
    pub who_id: i64,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub og_site: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub og_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub og_image: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub og_description: Option<String>,
    pub video_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video_entry::Entity",
        from = "Column::VideoId",
        to = "super::video_entry::Column::Id"
    )]
    VideoEntry,
}

impl Related<super::video_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
