use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A playable video referenced by exactly one url entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub content_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::url_entry::Entity")]
    UrlEntry,
}

impl Related<super::url_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UrlEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
