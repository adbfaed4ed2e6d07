pub mod config;
pub mod db;
pub mod entry;
pub mod fetcher;
pub mod ingest;
pub mod maintenance;
pub mod metadata;
pub mod queries;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::warn;

/// Chat message as published by the chat-platform client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel_id: i64,
    pub message_id: i64,
    pub date: DateTime<Utc>,
    pub sender: Sender,
    pub text: String,
    pub text_html: String,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Sender {
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// A span of the message text tagged by the chat platform's parser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntity {
    pub kind: EntityKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Url,
    TextLink,
    Mention,
    Hashtag,
    #[serde(other)]
    Other,
}

impl ChatMessage {
    /// Distinct, syntactically valid http(s) URLs tagged in this message.
    pub fn urls(&self) -> HashSet<String> {
        let mut results = HashSet::new();
        if self.text.trim().is_empty() {
            return results;
        }

        for entity in &self.entities {
            if entity.kind != EntityKind::Url || !entity.text.starts_with("http") {
                continue;
            }
            if let Err(e) = url::Url::parse(&entity.text) {
                warn!("Invalid url {}: {}", entity.text, e);
                continue;
            }
            results.insert(entity.text.clone());
        }

        results
    }
}

/// Custom error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("RabbitMQ error: {0}")]
    RabbitMQ(#[from] lapin::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl From<::config::ConfigError> for ServiceError {
    fn from(e: ::config::ConfigError) -> Self {
        ServiceError::Config(e.to_string())
    }
}

/// RabbitMQ exchanges and queues
pub struct RabbitMQConfig;

impl RabbitMQConfig {
    pub const CHAT_MESSAGES_EXCHANGE: &'static str = "chat.messages";
    pub const CHAT_MESSAGES_QUEUE: &'static str = "chat.messages.queue";
    pub const CHAT_MESSAGES_ROUTING_KEY: &'static str = "chat.message";
}

pub mod logger {
    use tracing_subscriber::EnvFilter;

    pub fn init() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }
}
