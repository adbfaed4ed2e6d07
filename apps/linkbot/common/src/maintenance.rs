//! Bulk operations used by the admin tooling: deletes, metadata repair and
//! history import.

use crate::entry::Preview;
use crate::fetcher::MetadataFetcher;
use crate::ingest::process_url;
use crate::{ChatMessage, EntityKind, MessageEntity, Sender, ServiceError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use entity::{url_entry, video_entry};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, warn};

/// Owned videos are deleted with at most this many ids bound per statement.
pub const DELETE_CHUNK_SIZE: usize = 1000;

/// Deletes every entry of a channel. Returns the number of entries removed.
pub async fn delete_channel<C: ConnectionTrait>(db: &C, channel_id: i64) -> Result<u64, DbErr> {
    delete_where(db, Condition::all().add(url_entry::Column::ChannelId.eq(channel_id))).await
}

/// Deletes the entries of a channel created in `[start, end]`.
pub async fn delete_channel_range<C: ConnectionTrait>(
    db: &C,
    channel_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64, DbErr> {
    delete_where(
        db,
        Condition::all()
            .add(url_entry::Column::ChannelId.eq(channel_id))
            .add(url_entry::Column::CreatedAt.between(start, end)),
    )
    .await
}

// Videos are owned by their entry, so they go right after it.
async fn delete_where<C: ConnectionTrait>(db: &C, condition: Condition) -> Result<u64, DbErr> {
    let video_ids: Vec<i32> = url_entry::Entity::find()
        .select_only()
        .column(url_entry::Column::VideoId)
        .filter(condition.clone())
        .filter(url_entry::Column::VideoId.is_not_null())
        .into_tuple::<Option<i32>>()
        .all(db)
        .await?
        .into_iter()
        .flatten()
        .collect();

    let deleted = url_entry::Entity::delete_many()
        .filter(condition)
        .exec(db)
        .await?
        .rows_affected;

    for chunk in video_ids.chunks(DELETE_CHUNK_SIZE) {
        video_entry::Entity::delete_many()
            .filter(video_entry::Column::Id.is_in(chunk.iter().copied()))
            .exec(db)
            .await?;
    }

    Ok(deleted)
}

/// Re-fetches metadata for stored entries, newest first, and overwrites their
/// preview fields. `url_pattern` is a SQL `LIKE` pattern.
pub async fn repair_metadata(
    db: &DatabaseConnection,
    fetcher: &dyn MetadataFetcher,
    url_pattern: Option<&str>,
    limit: Option<u64>,
) -> Result<usize, DbErr> {
    let mut query = url_entry::Entity::find().order_by_desc(url_entry::Column::CreatedAt);
    if let Some(pattern) = url_pattern {
        query = query.filter(url_entry::Column::Url.like(pattern));
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let entries = query.all(db).await?;
    info!("Repairing metadata of {} entries", entries.len());

    let mut repaired = 0;
    for entry in entries {
        info!("Scraping {}", entry.url);
        let preview = Preview::from(fetcher.fetch(&entry.url).await);

        let txn = db.begin().await?;
        apply_preview(&txn, entry, preview).await?;
        txn.commit().await?;
        repaired += 1;
    }

    Ok(repaired)
}

/// Overwrites the preview of a stored entry. An unchanged video keeps its row.
pub async fn apply_preview<C: ConnectionTrait>(
    db: &C,
    entry: url_entry::Model,
    preview: Preview,
) -> Result<url_entry::Model, DbErr> {
    let old_video = match entry.video_id {
        Some(id) => video_entry::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    let (video_id, stale_video) = match (preview.video, old_video) {
        (Some(new), Some(old)) if new.matches(&old) => (Some(old.id), None),
        (Some(new), old) => (Some(new.insert(db).await?.id), old),
        (None, old) => (None, old),
    };

    let mut active: url_entry::ActiveModel = entry.into();
    active.og_site = Set(preview.og_site);
    active.og_title = Set(preview.og_title);
    active.og_image = Set(preview.og_image);
    active.og_description = Set(preview.og_description);
    active.video_id = Set(video_id);
    let updated = active.update(db).await?;

    if let Some(stale) = stale_video {
        video_entry::Entity::delete_by_id(stale.id).exec(db).await?;
    }

    Ok(updated)
}

/// A chat history export: either a bare list of messages or an object with a
/// `messages` list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryExport {
    Wrapped { messages: Vec<ExportedMessage> },
    Bare(Vec<ExportedMessage>),
}

impl HistoryExport {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn into_messages(self) -> Vec<ExportedMessage> {
        match self {
            HistoryExport::Wrapped { messages } | HistoryExport::Bare(messages) => messages,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportedMessage {
    pub id: i64,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_id: Option<String>,
    #[serde(default)]
    pub text: ExportedText,
    #[serde(default)]
    pub text_entities: Vec<ExportedEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExportedText {
    Plain(String),
    Parts(Vec<ExportedTextPart>),
}

impl Default for ExportedText {
    fn default() -> Self {
        ExportedText::Plain(String::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExportedTextPart {
    Plain(String),
    Entity { text: String },
}

#[derive(Debug, Deserialize)]
pub struct ExportedEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ExportedText {
    pub fn render(&self) -> String {
        match self {
            ExportedText::Plain(text) => text.clone(),
            ExportedText::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ExportedTextPart::Plain(text) | ExportedTextPart::Entity { text } => {
                        text.as_str()
                    }
                })
                .collect(),
        }
    }
}

impl ExportedMessage {
    /// Rebuilds the chat message as the ingest pipeline would have seen it.
    pub fn to_chat_message(&self, channel_id: i64) -> ChatMessage {
        let text = self.text.render();
        let sender_id = self
            .from_id
            .as_deref()
            .and_then(|id| id.trim_start_matches(|c: char| !c.is_ascii_digit()).parse().ok())
            .unwrap_or_else(|| rand::random_range(1..1_000_000));

        let entities = self
            .text_entities
            .iter()
            .filter(|e| e.kind == "link" || e.kind == "url")
            .map(|e| MessageEntity {
                kind: EntityKind::Url,
                text: e.text.clone(),
            })
            .collect();

        ChatMessage {
            channel_id,
            message_id: self.id,
            date: Utc.from_utc_datetime(&self.date),
            sender: Sender {
                id: sender_id,
                first_name: self.from.clone().unwrap_or_else(|| "unknown".to_string()),
                last_name: None,
            },
            text_html: html_escape(&text),
            text,
            entities,
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Replaces a channel's entries with the links found in an export.
///
/// Messages are replayed oldest first so the repost window is evaluated
/// against each message's own timestamp.
pub async fn import_history(
    db: &DatabaseConnection,
    fetcher: &dyn MetadataFetcher,
    channel_id: i64,
    export: HistoryExport,
) -> Result<usize, ServiceError> {
    let mut messages = export.into_messages();
    if messages.is_empty() {
        return Err(ServiceError::Config("Export contains no messages".to_string()));
    }
    messages.sort_by_key(|m| (m.date, m.id));

    let txn = db.begin().await?;
    let removed = delete_channel(&txn, channel_id).await?;
    info!("Removed {} existing entries of channel {}", removed, channel_id);

    let mut stored = 0;
    for exported in &messages {
        let message = exported.to_chat_message(channel_id);
        for entity in &message.entities {
            if !entity.text.starts_with("http") {
                warn!("Skipping non-http link {}", entity.text);
                continue;
            }
            if process_url(&txn, fetcher, &message, &entity.text).await? {
                stored += 1;
            }
        }
    }
    txn.commit().await?;

    info!("Imported {} entries into channel {}", stored, channel_id);
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "name": "links",
        "messages": [
            {
                "id": 12,
                "type": "message",
                "date": "2023-05-02T10:00:00",
                "from": "Grace",
                "from_id": "user1234",
                "text": ["look at ", {"type": "link", "text": "https://example.com/b"}, " <3"],
                "text_entities": [
                    {"type": "plain", "text": "look at "},
                    {"type": "link", "text": "https://example.com/b"},
                    {"type": "plain", "text": " <3"}
                ]
            },
            {
                "id": 11,
                "type": "service",
                "date": "2023-05-01T09:00:00"
            }
        ]
    }"#;

    #[test]
    fn test_parse_wrapped_export() {
        let export: HistoryExport = serde_json::from_str(EXPORT).unwrap();
        let messages = export.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text.render(), "look at https://example.com/b <3");
        assert_eq!(messages[1].text.render(), "");
    }

    #[test]
    fn test_parse_bare_export() {
        let export: HistoryExport = serde_json::from_str(
            r#"[{"id": 1, "date": "2023-05-01T09:00:00", "from": "A", "text": "hi"}]"#,
        )
        .unwrap();
        assert_eq!(export.into_messages().len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_export() {
        let err = HistoryExport::parse(r#"{"messages": [{"id": "twelve"}]}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Serialization(_)));
    }

    #[test]
    fn test_to_chat_message() {
        let export: HistoryExport = serde_json::from_str(EXPORT).unwrap();
        let messages = export.into_messages();
        let message = messages[0].to_chat_message(-100);

        assert_eq!(message.channel_id, -100);
        assert_eq!(message.message_id, 12);
        assert_eq!(message.sender.id, 1234);
        assert_eq!(message.sender.display_name(), "Grace");
        assert_eq!(message.text_html, "look at https://example.com/b &lt;3");
        assert_eq!(message.entities.len(), 1);
        assert_eq!(message.entities[0].text, "https://example.com/b");
        assert_eq!(
            message.date,
            Utc.with_ymd_and_hms(2023, 5, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_sender_id_gets_random_one() {
        let export: HistoryExport = serde_json::from_str(
            r#"[{"id": 1, "date": "2023-05-01T09:00:00", "text": "hi"}]"#,
        )
        .unwrap();
        let message = export.into_messages()[0].to_chat_message(1);
        assert!((1..1_000_000).contains(&message.sender.id));
        assert_eq!(message.sender.first_name, "unknown");
    }
}
