//! Playback resolution strategies.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::http::{HttpClient, HttpError, HttpRequest, DESKTOP_USER_AGENT, MOBILE_USER_AGENT};
use crate::record::ResolvedPlayback;

use super::quality::Quality;

const MOBILE_SITE_URL: &str = "https://m.bilibili.com";

/// Errors raised while resolving a single video.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("Transport failure: {0}")]
    Transport(#[from] HttpError),

    #[error("Upstream rejected request: code {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Video not found: {0}")]
    NotFound(String),
}

/// Identifiers a strategy needs to request a playback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackTarget {
    pub bvid: String,
    pub aid: u64,
    pub cid: u64,
}

/// One self-contained method of deriving a playback URL.
///
/// `Ok(None)` means the strategy ran but has nothing to offer.
#[async_trait]
pub trait PlaybackStrategy: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    async fn resolve(
        &self,
        target: &PlaybackTarget,
        quality: Quality,
    ) -> Result<Option<ResolvedPlayback>, ResolveError>;
}

/// Web player endpoint with a desktop browser identity.
pub struct DesktopStrategy {
    http: Arc<dyn HttpClient>,
    provider: ProviderConfig,
}

impl DesktopStrategy {
    pub fn new(http: Arc<dyn HttpClient>, provider: ProviderConfig) -> Self {
        Self { http, provider }
    }
}

#[async_trait]
impl PlaybackStrategy for DesktopStrategy {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn resolve(
        &self,
        target: &PlaybackTarget,
        quality: Quality,
    ) -> Result<Option<ResolvedPlayback>, ResolveError> {
        let referer = self.provider.video_page_url(&target.bvid);
        let request = HttpRequest::new(self.provider.api_url("/x/player/playurl"))
            .query("avid", target.aid)
            .query("bvid", &target.bvid)
            .query("cid", target.cid)
            .query("qn", quality.code())
            .query("fnval", 1)
            .query("fnver", 0)
            .query("fourk", 1)
            .header("User-Agent", DESKTOP_USER_AGENT)
            .header("Referer", referer.clone());

        fetch_playurl(self.http.as_ref(), request, &referer, DESKTOP_USER_AGENT).await
    }
}

/// Same endpoint family with a mobile browser identity (html5 platform).
pub struct MobileStrategy {
    http: Arc<dyn HttpClient>,
    provider: ProviderConfig,
}

impl MobileStrategy {
    pub fn new(http: Arc<dyn HttpClient>, provider: ProviderConfig) -> Self {
        Self { http, provider }
    }
}

#[async_trait]
impl PlaybackStrategy for MobileStrategy {
    fn name(&self) -> &str {
        "mobile"
    }

    async fn resolve(
        &self,
        target: &PlaybackTarget,
        quality: Quality,
    ) -> Result<Option<ResolvedPlayback>, ResolveError> {
        let referer = format!("{}/video/{}", MOBILE_SITE_URL, target.bvid);
        let request = HttpRequest::new(self.provider.api_url("/x/player/playurl"))
            .query("avid", target.aid)
            .query("bvid", &target.bvid)
            .query("cid", target.cid)
            .query("qn", quality.code())
            .query("platform", "html5")
            .query("high_quality", 1)
            .header("User-Agent", MOBILE_USER_AGENT)
            .header("Referer", referer.clone());

        fetch_playurl(self.http.as_ref(), request, &referer, MOBILE_USER_AGENT).await
    }
}

/// Extension point for external resolvers. Currently yields nothing.
#[derive(Debug, Default)]
pub struct ThirdPartyStrategy;

#[async_trait]
impl PlaybackStrategy for ThirdPartyStrategy {
    fn name(&self) -> &str {
        "third_party"
    }

    async fn resolve(
        &self,
        _target: &PlaybackTarget,
        _quality: Quality,
    ) -> Result<Option<ResolvedPlayback>, ResolveError> {
        Ok(None)
    }
}

async fn fetch_playurl(
    http: &dyn HttpClient,
    request: HttpRequest,
    referer: &str,
    user_agent: &str,
) -> Result<Option<ResolvedPlayback>, ResolveError> {
    debug!(url = %request.url, qn = ?request.query_value("qn"), "Requesting playurl");

    let response = http.get(request).await?;
    let envelope: PlayUrlEnvelope = response.json().map_err(|e| {
        ResolveError::Parse(format!("HTTP {}: invalid playurl body: {}", response.status, e))
    })?;

    if envelope.code != 0 {
        return Err(ResolveError::Upstream {
            code: envelope.code,
            message: envelope.message.unwrap_or_default(),
        });
    }

    let Some(segment) = envelope
        .data
        .and_then(|d| d.durl.into_iter().find(|s| !s.url.is_empty()))
    else {
        return Ok(None);
    };

    let mut playback = ResolvedPlayback::new(segment.url, referer, user_agent);
    playback.backup_urls = segment
        .backup_url
        .unwrap_or_default()
        .into_iter()
        .filter(|u| !u.is_empty())
        .collect();
    Ok(Some(playback))
}

// ============================================================================
// Playurl API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PlayUrlEnvelope {
    code: i64,
    message: Option<String>,
    data: Option<PlayUrlData>,
}

#[derive(Debug, Deserialize)]
struct PlayUrlData {
    #[serde(default)]
    durl: Vec<PlayUrlSegment>,
}

#[derive(Debug, Deserialize)]
struct PlayUrlSegment {
    #[serde(default)]
    url: String,
    backup_url: Option<Vec<String>>,
}
