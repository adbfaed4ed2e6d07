//! Turning a chat message and scraped metadata into storable records.

use crate::ChatMessage;
use crate::metadata::UrlMetadata;
use chrono::{DateTime, Utc};
use entity::{url_entry, video_entry};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

/// Video owned by a url entry, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub content_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub url: String,
}

impl NewVideo {
    pub fn matches(&self, stored: &video_entry::Model) -> bool {
        self.content_type == stored.content_type
            && self.width == stored.width
            && self.height == stored.height
            && self.url == stored.url
    }

    pub async fn insert<C: ConnectionTrait>(self, db: &C) -> Result<video_entry::Model, DbErr> {
        video_entry::ActiveModel {
            content_type: Set(self.content_type),
            width: Set(self.width),
            height: Set(self.height),
            url: Set(self.url),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}

/// The preview part of an entry: everything a metadata repair may overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub og_site: Option<String>,
    pub og_title: Option<String>,
    pub og_image: Option<String>,
    pub og_description: Option<String>,
    pub video: Option<NewVideo>,
}

impl From<Option<UrlMetadata>> for Preview {
    fn from(metadata: Option<UrlMetadata>) -> Self {
        let Some(metadata) = metadata else {
            return Self::default();
        };

        let video = match (metadata.video_url, metadata.video_type) {
            (Some(url), Some(content_type)) => Some(NewVideo {
                content_type,
                width: metadata.video_width,
                height: metadata.video_height,
                url,
            }),
            _ => None,
        };

        Self {
            og_site: metadata.site,
            og_title: metadata.title,
            og_image: metadata.image,
            og_description: metadata.description,
            video,
        }
    }
}

/// A url entry, not yet stored, together with its owned video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlEntry {
    pub channel_id: i64,
    pub message_id: i64,
    pub created_at: DateTime<Utc>,
    pub who: String,
    pub who_id: i64,
    pub url: String,
    pub message: String,
    pub preview: Preview,
}

pub fn build_entry(message: &ChatMessage, url: &str, metadata: Option<UrlMetadata>) -> NewUrlEntry {
    NewUrlEntry {
        channel_id: message.channel_id,
        message_id: message.message_id,
        created_at: message.date,
        who: message.sender.display_name(),
        who_id: message.sender.id,
        url: url.to_string(),
        message: message.text_html.clone(),
        preview: Preview::from(metadata),
    }
}

impl NewUrlEntry {
    /// Stores the video first so the entry can reference it.
    pub async fn insert<C: ConnectionTrait>(self, db: &C) -> Result<url_entry::Model, DbErr> {
        let video_id = match self.preview.video {
            Some(video) => Some(video.insert(db).await?.id),
            None => None,
        };

        url_entry::ActiveModel {
            channel_id: Set(self.channel_id),
            message_id: Set(self.message_id),
            created_at: Set(self.created_at),
            who: Set(self.who),
            who_id: Set(self.who_id),
            url: Set(self.url),
            message: Set(self.message),
            og_site: Set(self.preview.og_site),
            og_title: Set(self.preview.og_title),
            og_image: Set(self.preview.og_image),
            og_description: Set(self.preview.og_description),
            video_id: Set(video_id),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
