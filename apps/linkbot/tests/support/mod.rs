//! Shared fixtures for the pipeline tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::fetcher::{MetadataFetcher, normalize_url};
use common::metadata::{UrlMetadata, extract_from_html};
use common::{ChatMessage, EntityKind, MessageEntity, Sender};
use entity::{url_entry, video_entry};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use std::collections::HashMap;
use std::sync::Mutex;

/// Fresh in-memory database with the schema applied
pub async fn setup_test_database() -> DatabaseConnection {
    let db = Database::connect(
        ConnectOptions::new("sqlite::memory:")
            .max_connections(1)
            .sqlx_logging(false)
            .to_owned(),
    )
    .await
    .unwrap();

    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn count_entries(db: &DatabaseConnection) -> u64 {
    url_entry::Entity::find().count(db).await.unwrap()
}

pub async fn count_videos(db: &DatabaseConnection) -> u64 {
    video_entry::Entity::find().count(db).await.unwrap()
}

/// Fetcher that serves canned HTML keyed by the normalized URL and records
/// every URL it was asked for.
#[derive(Default)]
pub struct RecordingFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn set_page(&mut self, url: &str, html: &str) {
        self.pages.insert(url.to_string(), html.to_string());
    }
}

#[async_trait]
impl MetadataFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str) -> Option<UrlMetadata> {
        let url = normalize_url(url);
        self.requested.lock().unwrap().push(url.clone());
        let html = self.pages.get(&url)?;
        extract_from_html(html, &url)
    }
}

pub fn chat_message(
    channel_id: i64,
    message_id: i64,
    date: DateTime<Utc>,
    urls: &[&str],
) -> ChatMessage {
    let text = format!("links: {}", urls.join(" "));
    ChatMessage {
        channel_id,
        message_id,
        date,
        sender: Sender {
            id: 99,
            first_name: "Grace".to_string(),
            last_name: Some("Hopper".to_string()),
        },
        text_html: text.clone(),
        text,
        entities: urls
            .iter()
            .map(|url| MessageEntity {
                kind: EntityKind::Url,
                text: url.to_string(),
            })
            .collect(),
    }
}

pub fn og_page(title: &str, description: &str) -> String {
    format!(
        r#"<html><head>
        <meta property="og:site_name" content="Example">
        <meta property="og:title" content="{title}">
        <meta property="og:description" content="{description}">
        </head><body></body></html>"#
    )
}

pub fn video_page() -> String {
    r#"<html><head>
    <meta property="og:description" content="a clip">
    <meta property="og:video" content="https://video.example.com/clip.mp4">
    <meta property="og:video:type" content="video/mp4">
    <meta property="og:video:width" content="640">
    <meta property="og:video:height" content="360">
    </head></html>"#
        .to_string()
}
