use crate::entry::build_entry;
use crate::fetcher::MetadataFetcher;
use crate::{ChatMessage, ServiceError};
use chrono::Duration;
use entity::url_entry;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use tracing::{info, warn};

/// Hosts whose links are never stored.
pub const IGNORED_HOSTNAMES: &[&str] = &["rejugan.do"];

/// A URL seen within this many hours before a message is a repost.
pub const DEDUP_WINDOW_HOURS: i64 = 24;

pub fn should_skip_url(url: &str) -> bool {
    let Some(hostname) = url.split('/').nth(2) else {
        warn!("Invalid url {}", url);
        return false;
    };

    let skip = IGNORED_HOSTNAMES.contains(&hostname);
    if skip {
        info!("Skipping {}", url);
    }
    skip
}

/// Stores a single URL from `message` unless it is ignored or a recent repost.
///
/// The entry is written through `db`, which is expected to be the caller's
/// transaction. Returns whether an entry was written.
pub async fn process_url<C: ConnectionTrait>(
    db: &C,
    fetcher: &dyn MetadataFetcher,
    message: &ChatMessage,
    url: &str,
) -> Result<bool, DbErr> {
    if should_skip_url(url) {
        return Ok(false);
    }

    // Relative to the message, not to now, so that imports dedup correctly.
    let since = message.date - Duration::hours(DEDUP_WINDOW_HOURS);
    let recent = url_entry::Entity::find()
        .filter(url_entry::Column::Url.eq(url))
        .filter(url_entry::Column::CreatedAt.gt(since))
        .count(db)
        .await?;
    if recent > 0 {
        info!("Url {} already posted in the last 24h, skipping", url);
        return Ok(false);
    }

    info!("Scraping {}", url);
    let metadata = fetcher.fetch(url).await;
    let entry = build_entry(message, url, metadata);

    info!("Storing entry: {}", url);
    entry.insert(db).await?;

    Ok(true)
}

/// Runs every URL of `message` through [`process_url`] in one transaction.
pub async fn handle_message(
    db: &DatabaseConnection,
    fetcher: &dyn MetadataFetcher,
    message: &ChatMessage,
) -> Result<usize, ServiceError> {
    let urls = message.urls();
    info!("Found {} urls", urls.len());

    if urls.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let mut stored = 0;
    for url in &urls {
        if process_url(&txn, fetcher, message, url).await? {
            stored += 1;
        }
    }
    txn.commit().await?;

    Ok(stored)
}
