//! Canonical video metadata (internal ids needed by playback strategies).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalogue::{lenient_u64, CatalogueEntry, RawDuration};
use crate::config::ProviderConfig;
use crate::http::{HttpClient, HttpRequest, DESKTOP_USER_AGENT};

use super::strategy::{PlaybackTarget, ResolveError};

/// Video metadata from the view endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub bvid: String,
    pub aid: u64,
    /// Id of the first part.
    pub cid: u64,
    pub title: String,
    pub pic: String,
    pub pubdate: i64,
    /// Seconds.
    pub duration: u64,
    pub description: String,
    pub owner: Option<String>,
    pub view_count: u64,
    pub category: Option<String>,
}

impl VideoMetadata {
    pub fn target(&self) -> PlaybackTarget {
        PlaybackTarget {
            bvid: self.bvid.clone(),
            aid: self.aid,
            cid: self.cid,
        }
    }
}

impl From<&VideoMetadata> for CatalogueEntry {
    fn from(meta: &VideoMetadata) -> Self {
        CatalogueEntry {
            id: meta.bvid.clone(),
            aid: Some(meta.aid),
            title: meta.title.clone(),
            cover: meta.pic.clone(),
            created: meta.pubdate,
            play_count: meta.view_count,
            duration: RawDuration::Seconds(meta.duration),
            description: Some(meta.description.clone()),
            author: meta.owner.clone(),
            category: meta.category.clone(),
        }
    }
}

/// Client for the video view endpoint.
pub struct MetadataClient {
    http: Arc<dyn HttpClient>,
    provider: ProviderConfig,
}

impl MetadataClient {
    pub fn new(http: Arc<dyn HttpClient>, provider: ProviderConfig) -> Self {
        Self { http, provider }
    }

    pub async fn fetch(&self, bvid: &str) -> Result<VideoMetadata, ResolveError> {
        debug!(bvid = %bvid, "Fetching video metadata");

        let request = HttpRequest::new(self.provider.api_url("/x/web-interface/view"))
            .query("bvid", bvid)
            .header("User-Agent", DESKTOP_USER_AGENT)
            .header("Referer", self.provider.web_base_url.clone());

        let response = self.http.get(request).await?;
        let envelope: ViewEnvelope = response.json().map_err(|e| {
            ResolveError::Parse(format!("HTTP {}: invalid view body: {}", response.status, e))
        })?;

        if envelope.code != 0 {
            return Err(ResolveError::Upstream {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }

        let view = envelope
            .data
            .ok_or_else(|| ResolveError::NotFound(bvid.to_string()))?;
        if view.cid == 0 {
            return Err(ResolveError::Parse(format!("no cid for {}", bvid)));
        }
        Ok(view.into())
    }
}

// ============================================================================
// View API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ViewEnvelope {
    code: i64,
    message: Option<String>,
    data: Option<ViewData>,
}

#[derive(Debug, Deserialize)]
struct ViewData {
    bvid: String,
    aid: u64,
    #[serde(default)]
    cid: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pic: String,
    #[serde(default)]
    pubdate: i64,
    #[serde(default)]
    duration: u64,
    #[serde(default)]
    desc: String,
    tname: Option<String>,
    owner: Option<ViewOwner>,
    stat: Option<ViewStat>,
}

#[derive(Debug, Deserialize)]
struct ViewOwner {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ViewStat {
    #[serde(default, deserialize_with = "lenient_u64")]
    view: u64,
}

impl From<ViewData> for VideoMetadata {
    fn from(v: ViewData) -> Self {
        Self {
            bvid: v.bvid,
            aid: v.aid,
            cid: v.cid,
            title: v.title,
            pic: v.pic,
            pubdate: v.pubdate,
            duration: v.duration,
            description: v.desc,
            owner: v.owner.map(|o| o.name),
            view_count: v.stat.map(|s| s.view).unwrap_or(0),
            category: v.tname.filter(|t| !t.is_empty()),
        }
    }
}
