use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A playable media URL with everything needed to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPlayback {
    /// Canonical media URL (relayed, when a relay was used).
    pub url: String,
    /// Alternate URLs in provider preference order.
    #[serde(default)]
    pub backup_urls: Vec<String>,
    /// Headers required to fetch the media (at least `Referer` and `User-Agent`).
    pub headers: BTreeMap<String, String>,
    /// Set when `url` was rewritten through a relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayInfo>,
}

impl ResolvedPlayback {
    pub fn new(url: impl Into<String>, referer: &str, user_agent: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Referer".to_string(), referer.to_string());
        headers.insert("User-Agent".to_string(), user_agent.to_string());
        Self {
            url: url.into(),
            backup_urls: Vec::new(),
            headers,
            relay: None,
        }
    }

    /// Replace the URL with a relayed one, keeping the original.
    pub fn relayed_through(mut self, relay_base: &str, relayed_url: String) -> Self {
        let original_url = std::mem::replace(&mut self.url, relayed_url);
        self.relay = Some(RelayInfo {
            relay_base: relay_base.to_string(),
            original_url,
        });
        self
    }
}

/// Which relay served a playback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayInfo {
    pub relay_base: String,
    pub original_url: String,
}

/// Output record handed to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub release_date: String,
    pub media_type: String,
    pub genre_title: String,
    pub duration_text: String,
    pub rating: String,
    pub play_count_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub content: RecordContent,
}

impl MediaRecord {
    pub fn is_video(&self) -> bool {
        matches!(self.content, RecordContent::Video { .. })
    }

    pub fn video_url(&self) -> Option<&str> {
        match &self.content {
            RecordContent::Video { video_url, .. } => Some(video_url),
            RecordContent::Link { .. } => None,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match &self.content {
            RecordContent::Link { link } => Some(link),
            RecordContent::Video { .. } => None,
        }
    }
}

/// Either a resolved playback or a navigational link, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordContent {
    #[serde(rename_all = "camelCase")]
    Video {
        video_url: String,
        headers: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        backup_urls: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_url: Option<String>,
    },
    Link {
        link: String,
    },
}

impl From<ResolvedPlayback> for RecordContent {
    fn from(playback: ResolvedPlayback) -> Self {
        RecordContent::Video {
            video_url: playback.url,
            headers: playback.headers,
            backup_urls: playback.backup_urls,
            original_url: playback.relay.map(|r| r.original_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(content: RecordContent) -> MediaRecord {
        MediaRecord {
            id: "BV1xx".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            poster_path: String::new(),
            backdrop_path: String::new(),
            release_date: "2024-01-01".to_string(),
            media_type: "movie".to_string(),
            genre_title: "g".to_string(),
            duration_text: "01:00".to_string(),
            rating: "6.0".to_string(),
            play_count_text: "1".to_string(),
            author: None,
            content,
        }
    }

    #[test]
    fn test_link_record_has_no_video_fields() {
        let value = serde_json::to_value(record(RecordContent::Link {
            link: "https://www.bilibili.com/video/BV1xx".to_string(),
        }))
        .unwrap();

        assert_eq!(value["type"], "link");
        assert_eq!(value["link"], "https://www.bilibili.com/video/BV1xx");
        assert!(value.get("videoUrl").is_none());
        assert!(value.get("headers").is_none());
        assert!(value.get("backupUrls").is_none());
    }

    #[test]
    fn test_video_record_shape() {
        let playback = ResolvedPlayback::new("https://cdn/v.mp4", "https://ref", "UA");
        let value = serde_json::to_value(record(playback.into())).unwrap();

        assert_eq!(value["type"], "video");
        assert_eq!(value["videoUrl"], "https://cdn/v.mp4");
        assert_eq!(
            value["headers"],
            json!({"Referer": "https://ref", "User-Agent": "UA"})
        );
        assert!(value.get("link").is_none());
        assert!(value.get("backupUrls").is_none());
        assert_eq!(value["posterPath"], "");
        assert_eq!(value["mediaType"], "movie");
    }

    #[test]
    fn test_relayed_playback_keeps_original() {
        let playback = ResolvedPlayback::new("https://cdn/v.mp4", "r", "u")
            .relayed_through("https://relay/?u=", "https://relay/?u=x".to_string());

        assert_eq!(playback.url, "https://relay/?u=x");
        let relay = playback.relay.clone().unwrap();
        assert_eq!(relay.original_url, "https://cdn/v.mp4");
        assert_eq!(relay.relay_base, "https://relay/?u=");

        let value = serde_json::to_value(record(playback.into())).unwrap();
        assert_eq!(value["originalUrl"], "https://cdn/v.mp4");
    }

    #[test]
    fn test_record_roundtrip_through_json() {
        let original = record(RecordContent::Link {
            link: "https://x".to_string(),
        });
        let json = serde_json::to_string(&original).unwrap();
        let parsed: MediaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
