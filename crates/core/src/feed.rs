//! Single-page feeds (search, popular, category) mapped into link records.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::catalogue::{lenient_u64, CatalogueEntry, RawDuration};
use crate::config::ProviderConfig;
use crate::http::{HttpClient, HttpError, HttpRequest, DESKTOP_USER_AGENT};
use crate::record::{map_entry, strip_html_tags, MediaRecord};
use crate::resolver::ResolveError;

/// Entries per feed page.
pub const FEED_PAGE_SIZE: u32 = 20;

static VIDEO_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/video/(BV[a-zA-Z0-9]+)").unwrap());
static BARE_VIDEO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^BV[a-zA-Z0-9]+$").unwrap());

/// Errors from feed and detail operations. These propagate to the caller.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Search keyword must not be empty")]
    EmptyKeyword,

    #[error("Transport failure: {0}")]
    Transport(#[from] HttpError),

    #[error("Upstream rejected request: code {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

/// Extract a `BV…` id from a bare id or a video page URL.
pub fn extract_video_id(link: &str) -> Result<String, FeedError> {
    let link = link.trim();
    if BARE_VIDEO_ID.is_match(link) {
        return Ok(link.to_string());
    }
    VIDEO_PATH
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| FeedError::InvalidVideoId(link.to_string()))
}

/// Client for the one-page feeds.
pub struct FeedClient {
    http: Arc<dyn HttpClient>,
    provider: ProviderConfig,
}

impl FeedClient {
    pub fn new(http: Arc<dyn HttpClient>, provider: ProviderConfig) -> Self {
        Self { http, provider }
    }

    /// Keyword search, most relevant first. Highlight markup is removed from titles.
    pub async fn search(&self, keyword: &str, page: u32) -> Result<Vec<MediaRecord>, FeedError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(FeedError::EmptyKeyword);
        }

        let request = self
            .request("/x/web-interface/search/type")
            .query("search_type", "video")
            .query("keyword", keyword)
            .query("page", page.max(1))
            .query("order", "totalrank")
            .query("duration", 0)
            .query("tids", 0);

        let data: SearchData = self.fetch(request).await?;
        Ok(self.map_all(data.result.into_iter().map(|hit| {
            let mut entry = CatalogueEntry::from(hit);
            entry.title = strip_html_tags(&entry.title);
            entry
        })))
    }

    /// Site-wide popular list.
    pub async fn popular(&self, page: u32) -> Result<Vec<MediaRecord>, FeedError> {
        let request = self
            .request("/x/web-interface/popular")
            .query("ps", FEED_PAGE_SIZE)
            .query("pn", page.max(1));

        let data: PopularData = self.fetch(request).await?;
        Ok(self.map_all(data.list.into_iter().map(CatalogueEntry::from)))
    }

    /// Newest uploads in a category (`tid` 0 for all).
    pub async fn category(&self, tid: u32, page: u32) -> Result<Vec<MediaRecord>, FeedError> {
        let request = self
            .request("/x/web-interface/newlist")
            .query("rid", tid)
            .query("pn", page.max(1))
            .query("ps", FEED_PAGE_SIZE)
            .query("type", 0);

        let data: CategoryData = self.fetch(request).await?;
        Ok(self.map_all(data.archives.into_iter().map(CatalogueEntry::from)))
    }

    fn request(&self, path: &str) -> HttpRequest {
        HttpRequest::new(self.provider.api_url(path))
            .header("User-Agent", DESKTOP_USER_AGENT)
            .header("Referer", self.provider.web_base_url.clone())
    }

    async fn fetch<T: serde::de::DeserializeOwned + Default>(
        &self,
        request: HttpRequest,
    ) -> Result<T, FeedError> {
        debug!(url = %request.url, "Fetching feed page");

        let response = self.http.get(request).await?;
        let envelope: FeedEnvelope<T> = response.json().map_err(|e| {
            FeedError::Parse(format!("HTTP {}: invalid feed body: {}", response.status, e))
        })?;

        if envelope.code != 0 {
            return Err(FeedError::Upstream {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope.data.unwrap_or_default())
    }

    fn map_all(&self, entries: impl Iterator<Item = CatalogueEntry>) -> Vec<MediaRecord> {
        entries
            .filter(|e| !e.id.is_empty())
            .map(|e| map_entry(&e, &self.provider))
            .collect()
    }
}

// ============================================================================
// Feed API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeedEnvelope<T> {
    code: i64,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    bvid: String,
    aid: Option<u64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pic: String,
    #[serde(default)]
    pubdate: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    play: u64,
    /// `"M:SS"` text.
    #[serde(default)]
    duration: String,
    description: Option<String>,
    author: Option<String>,
    typename: Option<String>,
}

impl From<SearchHit> for CatalogueEntry {
    fn from(hit: SearchHit) -> Self {
        Self {
            id: hit.bvid,
            aid: hit.aid,
            title: hit.title,
            cover: hit.pic,
            created: hit.pubdate,
            play_count: hit.play,
            duration: RawDuration::Text(hit.duration),
            description: hit.description,
            author: hit.author,
            category: hit.typename,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PopularData {
    #[serde(default)]
    list: Vec<Archive>,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryData {
    #[serde(default)]
    archives: Vec<Archive>,
}

#[derive(Debug, Deserialize)]
struct Archive {
    #[serde(default)]
    bvid: String,
    aid: Option<u64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pic: String,
    #[serde(default)]
    pubdate: i64,
    #[serde(default)]
    duration: u64,
    desc: Option<String>,
    tname: Option<String>,
    owner: Option<ArchiveOwner>,
    stat: Option<ArchiveStat>,
}

#[derive(Debug, Deserialize)]
struct ArchiveOwner {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArchiveStat {
    #[serde(default, deserialize_with = "lenient_u64")]
    view: u64,
}

impl From<Archive> for CatalogueEntry {
    fn from(a: Archive) -> Self {
        Self {
            id: a.bvid,
            aid: a.aid,
            title: a.title,
            cover: a.pic,
            created: a.pubdate,
            play_count: a.stat.map(|s| s.view).unwrap_or(0),
            duration: RawDuration::Seconds(a.duration),
            description: a.desc,
            author: a.owner.map(|o| o.name),
            category: a.tname,
        }
    }
}
