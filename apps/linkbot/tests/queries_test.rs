/// Tests for the channel page queries
mod support;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::ingest::process_url;
use common::queries::{distinct_days, entries_between, group_by_day, recent_entries};
use support::{RecordingFetcher, chat_message, setup_test_database, video_page};

const CHANNEL: i64 = -1001;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_entries_between_newest_first_with_videos() {
    let db = setup_test_database().await;
    let fetcher = RecordingFetcher::new().with_page("https://v.example.com/", &video_page());
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let posts = [
        (1, base, "https://a.example.com/"),
        (2, base + Duration::hours(2), "https://v.example.com/"),
        (3, base + Duration::days(10), "https://late.example.com/"),
    ];
    for (id, at, url) in posts {
        let message = chat_message(CHANNEL, id, at, &[url]);
        process_url(&db, &fetcher, &message, url).await.unwrap();
    }
    let other = chat_message(-5, 9, base, &["https://elsewhere.example.com/"]);
    process_url(&db, &fetcher, &other, "https://elsewhere.example.com/")
        .await
        .unwrap();

    let entries = entries_between(&db, CHANNEL, base - Duration::hours(1), base + Duration::days(1))
        .await
        .unwrap();

    let ids: Vec<i64> = entries.iter().map(|(e, _)| e.message_id).collect();
    assert_eq!(ids, vec![2, 1]);
    let video = entries[0].1.as_ref().expect("video should be loaded");
    assert_eq!(video.content_type, "video/mp4");
    assert!(entries[1].1.is_none());
}

#[tokio::test]
async fn test_recent_entries_grouped_by_day() {
    let db = setup_test_database().await;
    let fetcher = RecordingFetcher::new();
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();

    let posts = [
        (1, now - Duration::days(40), "https://ancient.example.com/"),
        (2, now - Duration::days(2), "https://b.example.com/"),
        (3, now - Duration::hours(2), "https://c.example.com/"),
        (4, now - Duration::hours(1), "https://d.example.com/"),
    ];
    for (id, at, url) in posts {
        let message = chat_message(CHANNEL, id, at, &[url]);
        process_url(&db, &fetcher, &message, url).await.unwrap();
    }

    let entries = recent_entries(&db, CHANNEL, now, 30).await.unwrap();
    let days = group_by_day(entries);

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].0, day(2024, 3, 10));
    assert_eq!(days[0].1.len(), 2);
    assert_eq!(days[1].0, day(2024, 3, 8));
}

#[tokio::test]
async fn test_distinct_days_pages_by_cursor() {
    let db = setup_test_database().await;
    let fetcher = RecordingFetcher::new();

    let posts = [
        (1, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
        (2, Utc.with_ymd_and_hms(2024, 3, 1, 21, 0, 0).unwrap()),
        (3, Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()),
        (4, Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap()),
        (5, Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap()),
    ];
    for (id, at) in posts {
        let url = format!("https://example.com/{id}");
        let message = chat_message(CHANNEL, id, at, &[url.as_str()]);
        process_url(&db, &fetcher, &message, &url).await.unwrap();
    }

    let first_page = distinct_days(&db, CHANNEL, None, 2).await.unwrap();
    assert_eq!(first_page, vec![day(2024, 3, 7), day(2024, 3, 4)]);

    let second_page = distinct_days(&db, CHANNEL, Some(day(2024, 3, 4)), 2)
        .await
        .unwrap();
    assert_eq!(second_page, vec![day(2024, 3, 1)]);

    let other_channel = distinct_days(&db, -5, None, 10).await.unwrap();
    assert!(other_channel.is_empty());
}
