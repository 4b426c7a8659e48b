// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform record normalization.
//!
//! Maps platform-native JSON records into [`NormalizedItem`]s. Field names and
//! timestamp formats for each platform live in one [`FieldMapping`] table, so
//! adding a platform means one new table entry.
//!
//! Normalization is total: every raw record yields exactly one item. A
//! timestamp that fails to parse leaves `original_published_at` empty.

use crate::models::{ContentType, NormalizedItem, Platform};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// A platform-native record as returned by an adapter.
pub type RawItem = Value;

/// How a platform encodes its publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2023-10-26T10:00:00Z`, optionally with fractional seconds
    Iso8601Utc,
    /// `Wed Oct 25 20:00:00 +0000 2023`
    ClassicTwitter,
    /// Seconds since the Unix epoch, integer or float
    UnixEpoch,
}

/// Where the unified fields come from in one platform's records.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub content_type: ContentType,
    pub id_field: &'static str,
    pub title_field: &'static str,
    pub url_field: &'static str,
    pub description_field: Option<&'static str>,
    pub timestamp_field: &'static str,
    pub timestamp_format: TimestampFormat,
}

const YOUTUBE: FieldMapping = FieldMapping {
    content_type: ContentType::Video,
    id_field: "id",
    title_field: "title",
    url_field: "url",
    description_field: Some("description"),
    timestamp_field: "publishedAt",
    timestamp_format: TimestampFormat::Iso8601Utc,
};

const TWITTER: FieldMapping = FieldMapping {
    content_type: ContentType::Tweet,
    id_field: "id",
    title_field: "text",
    url_field: "url",
    description_field: Some("text"),
    timestamp_field: "created_at",
    timestamp_format: TimestampFormat::ClassicTwitter,
};

const REDDIT: FieldMapping = FieldMapping {
    content_type: ContentType::Post,
    id_field: "id",
    title_field: "title",
    url_field: "url",
    description_field: Some("selftext"),
    timestamp_field: "created_utc",
    timestamp_format: TimestampFormat::UnixEpoch,
};

/// Field mapping for a platform.
pub fn mapping(platform: Platform) -> &'static FieldMapping {
    match platform {
        Platform::Youtube => &YOUTUBE,
        Platform::Twitter => &TWITTER,
        Platform::Reddit => &REDDIT,
    }
}

/// Normalize a batch of raw records from `platform`.
pub fn normalize(platform: Platform, raw_items: &[RawItem]) -> Vec<NormalizedItem> {
    let fields = mapping(platform);
    raw_items
        .iter()
        .map(|raw| normalize_one(platform, fields, raw))
        .collect()
}

fn normalize_one(platform: Platform, fields: &FieldMapping, raw: &RawItem) -> NormalizedItem {
    let original_published_at = raw
        .get(fields.timestamp_field)
        .and_then(|ts| parse_timestamp(fields.timestamp_format, ts));

    if original_published_at.is_none() && raw.get(fields.timestamp_field).is_some() {
        tracing::debug!(
            platform = %platform,
            value = %raw[fields.timestamp_field],
            "Unparseable platform timestamp, leaving published time empty"
        );
    }

    NormalizedItem {
        platform,
        original_id: coerce_id(raw.get(fields.id_field)),
        title: string_field(raw, fields.title_field),
        url: string_field(raw, fields.url_field),
        description: fields
            .description_field
            .and_then(|field| string_field(raw, field))
            .filter(|d| !d.is_empty()),
        content_type: fields.content_type,
        original_published_at,
    }
}

/// Platform IDs may arrive as strings or numbers; always store a string.
fn coerce_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn string_field(raw: &RawItem, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Parse a platform timestamp, returning `None` if it does not match `format`.
pub fn parse_timestamp(format: TimestampFormat, value: &Value) -> Option<DateTime<Utc>> {
    match format {
        TimestampFormat::Iso8601Utc => {
            let s = value.as_str()?;
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
                .ok()
                .map(|naive| naive.and_utc())
        }
        TimestampFormat::ClassicTwitter => {
            let s = value.as_str()?;
            DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y")
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
        TimestampFormat::UnixEpoch => {
            if let Some(secs) = value.as_i64() {
                return DateTime::from_timestamp(secs, 0);
            }
            let secs = value.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_youtube_item() {
        let raw = vec![json!({
            "id": "video1",
            "title": "Mock YouTube Video 1",
            "url": "http://youtube.com/watch?v=video1",
            "publishedAt": "2023-10-26T10:00:00Z"
        })];

        let items = normalize(Platform::Youtube, &raw);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.original_id, "video1");
        assert_eq!(item.title.as_deref(), Some("Mock YouTube Video 1"));
        assert_eq!(item.content_type, ContentType::Video);
        assert_eq!(item.description, None);
        assert_eq!(
            item.original_published_at,
            Some(Utc.with_ymd_and_hms(2023, 10, 26, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_youtube_fractional_seconds() {
        let ts = parse_timestamp(
            TimestampFormat::Iso8601Utc,
            &json!("2023-10-26T10:00:00.250Z"),
        )
        .unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);

        // Offset instead of Z is not the platform format
        assert!(parse_timestamp(
            TimestampFormat::Iso8601Utc,
            &json!("2023-10-26T10:00:00+02:00")
        )
        .is_none());
    }

    #[test]
    fn test_twitter_item_uses_text_for_title_and_description() {
        let raw = vec![json!({
            "id": "tweet1",
            "text": "Mock Tweet 1",
            "url": "http://twitter.com/user/status/tweet1",
            "created_at": "Wed Oct 25 20:00:00 +0000 2023"
        })];

        let item = &normalize(Platform::Twitter, &raw)[0];
        assert_eq!(item.title.as_deref(), Some("Mock Tweet 1"));
        assert_eq!(item.description.as_deref(), Some("Mock Tweet 1"));
        assert_eq!(item.content_type, ContentType::Tweet);
        assert_eq!(
            item.original_published_at,
            Some(Utc.with_ymd_and_hms(2023, 10, 25, 20, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_twitter_offset_converted_to_utc() {
        let ts = parse_timestamp(
            TimestampFormat::ClassicTwitter,
            &json!("Wed Oct 25 22:00:00 +0200 2023"),
        );
        assert_eq!(ts, Some(Utc.with_ymd_and_hms(2023, 10, 25, 20, 0, 0).unwrap()));
    }

    #[test]
    fn test_reddit_epoch() {
        let raw = vec![json!({
            "id": "post1",
            "title": "Mock Reddit Post 1",
            "url": "http://reddit.com/r/subreddit/comments/post1",
            "created_utc": 1698345600
        })];

        let item = &normalize(Platform::Reddit, &raw)[0];
        assert_eq!(item.content_type, ContentType::Post);
        assert_eq!(
            item.original_published_at,
            Some(Utc.with_ymd_and_hms(2023, 10, 26, 18, 40, 0).unwrap())
        );

        // Reddit's API reports floats
        let ts = parse_timestamp(TimestampFormat::UnixEpoch, &json!(1698345600.5)).unwrap();
        assert_eq!(ts.timestamp(), 1698345600);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_malformed_timestamps_keep_item() {
        let raw = vec![
            json!({"id": "a", "publishedAt": "yesterday"}),
            json!({"id": "b", "publishedAt": 12345}),
            json!({"id": "c"}),
        ];

        let items = normalize(Platform::Youtube, &raw);
        assert_eq!(items.len(), 3, "no record is dropped");
        assert!(items.iter().all(|i| i.original_published_at.is_none()));
        assert_eq!(items[2].original_id, "c");
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let raw = vec![json!({"id": 1234567890123u64, "text": "hi"}), json!({"text": "no id"})];
        let items = normalize(Platform::Twitter, &raw);
        assert_eq!(items[0].original_id, "1234567890123");
        assert_eq!(items[1].original_id, "");
    }

    #[test]
    fn test_empty_batch() {
        assert!(normalize(Platform::Reddit, &[]).is_empty());
    }
}
