//! Read-only queries backing the channel pages.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use entity::{url_entry, video_entry};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

pub type EntryWithVideo = (url_entry::Model, Option<video_entry::Model>);

/// Entries of a channel created in `[start, end]`, newest first, videos loaded.
pub async fn entries_between<C: ConnectionTrait>(
    db: &C,
    channel_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<EntryWithVideo>, DbErr> {
    url_entry::Entity::find()
        .filter(url_entry::Column::ChannelId.eq(channel_id))
        .filter(url_entry::Column::CreatedAt.between(start, end))
        .order_by_desc(url_entry::Column::CreatedAt)
        .find_also_related(video_entry::Entity)
        .all(db)
        .await
}

/// The default channel page: from the start of tomorrow back `days` days.
pub async fn recent_entries<C: ConnectionTrait>(
    db: &C,
    channel_id: i64,
    now: DateTime<Utc>,
    days: i64,
) -> Result<Vec<EntryWithVideo>, DbErr> {
    let end = start_of_day(now.date_naive() + Duration::days(1));
    let start = end - Duration::days(days);
    entries_between(db, channel_id, start, end).await
}

/// Groups entries that are already sorted newest first by calendar day.
pub fn group_by_day(entries: Vec<EntryWithVideo>) -> Vec<(NaiveDate, Vec<EntryWithVideo>)> {
    let mut days: Vec<(NaiveDate, Vec<EntryWithVideo>)> = Vec::new();
    for entry in entries {
        let day = entry.0.created_at.date_naive();
        match days.last_mut() {
            Some((current, group)) if *current == day => group.push(entry),
            _ => days.push((day, vec![entry])),
        }
    }
    days
}

/// Distinct days with entries, newest first, strictly before `before` if given.
///
/// Walks the `created_at` index one day at a time, so the cost is `limit`
/// small queries regardless of how many entries each day holds.
pub async fn distinct_days<C: ConnectionTrait>(
    db: &C,
    channel_id: i64,
    before: Option<NaiveDate>,
    limit: usize,
) -> Result<Vec<NaiveDate>, DbErr> {
    let mut days = Vec::with_capacity(limit);
    let mut cursor = before.map(start_of_day);

    while days.len() < limit {
        let mut query =
            url_entry::Entity::find().filter(url_entry::Column::ChannelId.eq(channel_id));
        if let Some(cursor) = cursor {
            query = query.filter(url_entry::Column::CreatedAt.lt(cursor));
        }

        let Some(latest) = query
            .order_by_desc(url_entry::Column::CreatedAt)
            .one(db)
            .await?
        else {
            break;
        };

        let day = latest.created_at.date_naive();
        days.push(day);
        cursor = Some(start_of_day(day));
    }

    Ok(days)
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::default()))
}
