//! Pure conversion of catalogue entries into [`MediaRecord`]s.

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::catalogue::{CatalogueEntry, RawDuration};
use crate::config::ProviderConfig;

use super::types::{MediaRecord, RecordContent, ResolvedPlayback};

const MEDIA_TYPE: &str = "movie";
const DEFAULT_GENRE: &str = "视频";
const BACKDROP_SUFFIX: &str = "@720w_405h_1c.webp";

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Map an entry into its link-form record.
pub fn map_entry(entry: &CatalogueEntry, provider: &ProviderConfig) -> MediaRecord {
    let poster = poster_url(&entry.cover);
    MediaRecord {
        id: entry.id.clone(),
        title: entry.title.clone(),
        description: entry
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| entry.title.clone()),
        backdrop_path: backdrop_url(&poster),
        poster_path: poster,
        release_date: format_date(entry.created),
        media_type: MEDIA_TYPE.to_string(),
        genre_title: entry
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_GENRE.to_string()),
        duration_text: format_duration(&entry.duration),
        rating: format_rating(entry.play_count).to_string(),
        play_count_text: format_play_count(entry.play_count),
        author: entry.author.clone(),
        content: RecordContent::Link {
            link: provider.video_page_url(&entry.id),
        },
    }
}

/// Attach a resolved playback, replacing the link.
pub fn with_playback(mut record: MediaRecord, playback: ResolvedPlayback) -> MediaRecord {
    record.content = playback.into();
    record
}

/// Single record standing in for an empty catalogue.
pub fn no_results_record(subject_id: &str, provider: &ProviderConfig) -> MediaRecord {
    synthetic(
        format!("{}-empty", subject_id),
        "No videos found".to_string(),
        format!("Uploader {} has no public videos.", subject_id),
        provider.space_page_url(subject_id),
    )
}

/// Record pointing at the full catalogue page for entries past the cap.
pub fn more_results_record(
    subject_id: &str,
    remaining: usize,
    provider: &ProviderConfig,
) -> MediaRecord {
    synthetic(
        format!("{}-more", subject_id),
        format!("{} more videos", remaining),
        "Open the uploader's page to browse the rest of the catalogue.".to_string(),
        provider.space_page_url(subject_id),
    )
}

/// Record describing a catalogue that could not be loaded at all.
pub fn error_record(subject_id: &str, message: &str, provider: &ProviderConfig) -> MediaRecord {
    synthetic(
        format!("{}-error", subject_id),
        "Failed to load videos".to_string(),
        message.to_string(),
        provider.space_page_url(subject_id),
    )
}

fn synthetic(id: String, title: String, description: String, link: String) -> MediaRecord {
    MediaRecord {
        id,
        title,
        description,
        poster_path: String::new(),
        backdrop_path: String::new(),
        release_date: String::new(),
        media_type: MEDIA_TYPE.to_string(),
        genre_title: DEFAULT_GENRE.to_string(),
        duration_text: String::new(),
        rating: String::new(),
        play_count_text: String::new(),
        author: None,
        content: RecordContent::Link { link },
    }
}

/// Normalize a cover reference to an absolute https URL.
pub fn poster_url(cover: &str) -> String {
    let cover = cover.trim();
    if let Some(rest) = cover.strip_prefix("//") {
        format!("https://{}", rest)
    } else if let Some(rest) = cover.strip_prefix("http://") {
        format!("https://{}", rest)
    } else {
        cover.to_string()
    }
}

pub fn backdrop_url(poster: &str) -> String {
    if poster.is_empty() {
        String::new()
    } else {
        format!("{}{}", poster, BACKDROP_SUFFIX)
    }
}

/// `YYYY-MM-DD` in UTC, or empty for a missing timestamp.
pub fn format_date(unix_secs: i64) -> String {
    if unix_secs <= 0 {
        return String::new();
    }
    Utc.timestamp_opt(unix_secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `MM:SS`, or `HH:MM:SS` from one hour up. Text already in clock form passes through.
pub fn format_duration(duration: &RawDuration) -> String {
    match duration {
        RawDuration::Text(text) if text.contains(':') => text.clone(),
        RawDuration::Text(text) => match text.trim().parse::<u64>() {
            Ok(secs) => clock(secs),
            Err(_) => text.clone(),
        },
        RawDuration::Seconds(secs) => clock(*secs),
    }
}

fn clock(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Display rating derived from popularity.
pub fn format_rating(play_count: u64) -> &'static str {
    match play_count {
        n if n > 1_000_000 => "9.0",
        n if n > 100_000 => "8.0",
        n if n > 10_000 => "7.0",
        _ => "6.0",
    }
}

/// Play count with `万` (10k) abbreviation.
pub fn format_play_count(play_count: u64) -> String {
    if play_count >= 10_000 {
        format!("{:.1}万", play_count as f64 / 10_000.0)
    } else {
        play_count.to_string()
    }
}

/// Remove highlight markup the search API wraps around matches.
pub fn strip_html_tags(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_map_entry_display_fields() {
        let mut entry = fixtures::entry("BV1abc");
        entry.cover = "//i0.hdslb.com/bfs/archive/x.jpg".to_string();
        entry.created = 1_700_000_000;
        entry.play_count = 1_500_000;
        entry.duration = RawDuration::Seconds(3725);

        let record = map_entry(&entry, &ProviderConfig::default());
        assert_eq!(record.id, "BV1abc");
        assert_eq!(record.poster_path, "https://i0.hdslb.com/bfs/archive/x.jpg");
        assert_eq!(
            record.backdrop_path,
            "https://i0.hdslb.com/bfs/archive/x.jpg@720w_405h_1c.webp"
        );
        assert_eq!(record.release_date, "2023-11-14");
        assert_eq!(record.duration_text, "01:02:05");
        assert_eq!(record.rating, "9.0");
        assert_eq!(record.play_count_text, "150.0万");
        assert_eq!(record.link(), Some("https://www.bilibili.com/video/BV1abc"));
        assert!(!record.is_video());
    }

    #[test]
    fn test_map_entry_defaults() {
        let mut entry = fixtures::entry("BV1abc");
        entry.description = Some("   ".to_string());
        entry.category = None;

        let record = map_entry(&entry, &ProviderConfig::default());
        assert_eq!(record.description, entry.title);
        assert_eq!(record.genre_title, "视频");
    }

    #[test]
    fn test_with_playback_replaces_link() {
        let record = map_entry(&fixtures::entry("BV1abc"), &ProviderConfig::default());
        let record = with_playback(
            record,
            ResolvedPlayback::new("https://cdn/v.mp4", "https://ref", "UA"),
        );
        assert!(record.is_video());
        assert_eq!(record.video_url(), Some("https://cdn/v.mp4"));
        assert_eq!(record.link(), None);
    }

    #[test]
    fn test_synthetic_records_link_to_space() {
        let provider = ProviderConfig::default();
        let empty = no_results_record("42", &provider);
        assert_eq!(empty.link(), Some("https://space.bilibili.com/42/video"));

        let more = more_results_record("42", 7, &provider);
        assert_eq!(more.title, "7 more videos");
        assert_eq!(more.link(), Some("https://space.bilibili.com/42/video"));

        let error = error_record("42", "timed out", &provider);
        assert_eq!(error.description, "timed out");
        assert!(!error.is_video());
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(poster_url("//a/b.jpg"), "https://a/b.jpg");
        assert_eq!(poster_url("http://a/b.jpg"), "https://a/b.jpg");
        assert_eq!(poster_url("https://a/b.jpg"), "https://a/b.jpg");
        assert_eq!(poster_url(""), "");
        assert_eq!(backdrop_url(""), "");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "");
        assert_eq!(format_date(86_400), "1970-01-02");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&RawDuration::Seconds(0)), "00:00");
        assert_eq!(format_duration(&RawDuration::Seconds(205)), "03:25");
        assert_eq!(format_duration(&RawDuration::Seconds(3600)), "01:00:00");
        assert_eq!(
            format_duration(&RawDuration::Text("3:25".to_string())),
            "3:25"
        );
        assert_eq!(
            format_duration(&RawDuration::Text("65".to_string())),
            "01:05"
        );
    }

    #[test]
    fn test_format_rating_thresholds() {
        assert_eq!(format_rating(1_000_001), "9.0");
        assert_eq!(format_rating(1_000_000), "8.0");
        assert_eq!(format_rating(100_001), "8.0");
        assert_eq!(format_rating(10_001), "7.0");
        assert_eq!(format_rating(10_000), "6.0");
    }

    #[test]
    fn test_format_play_count() {
        assert_eq!(format_play_count(9_999), "9999");
        assert_eq!(format_play_count(12_345), "1.2万");
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(
            strip_html_tags(r#"<em class="keyword">Rust</em> tutorial"#),
            "Rust tutorial"
        );
    }
}
