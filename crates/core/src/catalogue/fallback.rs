//! Fallback catalogue fetchers impersonating other client identities.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::http::{HttpClient, HttpRequest, APP_USER_AGENT, DESKTOP_USER_AGENT};
use crate::metrics::FALLBACK_FETCHES;

use super::page_fetcher::parse_space_response;
use super::types::{lenient_u64, CatalogueEntry, CatalogueError, RawDuration};
use super::wbi;

/// Alternate source for a subject's most recent entries.
///
/// Never fails: internal errors degrade to an empty list.
#[async_trait]
pub trait FallbackFetcher: Send + Sync {
    async fn fetch_fallback(&self, subject_id: &str) -> Vec<CatalogueEntry>;
}

/// Request shapes tried by [`AlternateClientFetcher`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternateClient {
    /// WBI-signed web endpoint.
    SignedWeb,
    /// Native app archive cursor endpoint.
    MobileApp,
}

impl AlternateClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlternateClient::SignedWeb => "signed_web",
            AlternateClient::MobileApp => "mobile_app",
        }
    }
}

/// Fallback fetcher trying a signed web request, then the app API.
pub struct AlternateClientFetcher {
    http: Arc<dyn HttpClient>,
    provider: ProviderConfig,
    limit: usize,
    clients: Vec<AlternateClient>,
}

impl AlternateClientFetcher {
    pub fn new(http: Arc<dyn HttpClient>, provider: ProviderConfig, limit: usize) -> Self {
        Self {
            http,
            provider,
            limit,
            clients: vec![AlternateClient::SignedWeb, AlternateClient::MobileApp],
        }
    }

    async fn fetch_with(
        &self,
        client: AlternateClient,
        subject_id: &str,
    ) -> Result<Vec<CatalogueEntry>, CatalogueError> {
        match client {
            AlternateClient::SignedWeb => self.fetch_signed(subject_id).await,
            AlternateClient::MobileApp => self.fetch_mobile(subject_id).await,
        }
    }

    async fn fetch_signed(&self, subject_id: &str) -> Result<Vec<CatalogueEntry>, CatalogueError> {
        let mixin_key = self.fetch_mixin_key().await?;
        let params = vec![
            ("mid".to_string(), subject_id.to_string()),
            ("ps".to_string(), self.limit.to_string()),
            ("pn".to_string(), "1".to_string()),
            ("order".to_string(), "pubdate".to_string()),
        ];
        let signed = wbi::sign(&params, &mixin_key, chrono::Utc::now().timestamp());

        let mut request = HttpRequest::new(self.provider.api_url("/x/space/wbi/arc/search"))
            .header("User-Agent", DESKTOP_USER_AGENT)
            .header(
                "Referer",
                format!(
                    "{}/{}",
                    self.provider.space_base_url.trim_end_matches('/'),
                    subject_id
                ),
            );
        request.query = signed;

        let response = self.http.get(request).await?;
        parse_space_response(&response)
    }

    async fn fetch_mixin_key(&self) -> Result<String, CatalogueError> {
        let request = HttpRequest::new(self.provider.api_url("/x/web-interface/nav"))
            .header("User-Agent", DESKTOP_USER_AGENT)
            .header("Referer", self.provider.web_base_url.clone());

        let response = self.http.get(request).await?;
        // The nav endpoint reports "not logged in" but still carries the keys.
        let nav: NavEnvelope = response
            .json()
            .map_err(|e| CatalogueError::Parse(format!("invalid nav body: {}", e)))?;

        let keys = nav
            .data
            .and_then(|d| d.wbi_img)
            .ok_or_else(|| CatalogueError::Parse("nav response without wbi_img".to_string()))?;

        match (wbi::key_from_url(&keys.img_url), wbi::key_from_url(&keys.sub_url)) {
            (Some(img), Some(sub)) => Ok(wbi::mixin_key(&img, &sub)),
            _ => Err(CatalogueError::Parse("malformed wbi key urls".to_string())),
        }
    }

    async fn fetch_mobile(&self, subject_id: &str) -> Result<Vec<CatalogueEntry>, CatalogueError> {
        let request = HttpRequest::new(self.provider.app_url("/x/v2/space/archive/cursor"))
            .query("vmid", subject_id)
            .query("ps", self.limit)
            .header("User-Agent", APP_USER_AGENT);

        let response = self.http.get(request).await?;
        let envelope: AppEnvelope = response.json().map_err(|e| {
            CatalogueError::Parse(format!(
                "HTTP {}: invalid archive cursor body: {}",
                response.status, e
            ))
        })?;

        if envelope.code != 0 {
            return Err(CatalogueError::Upstream {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }

        Ok(envelope
            .data
            .map(|d| d.item)
            .unwrap_or_default()
            .into_iter()
            .filter_map(AppArchive::into_entry)
            .collect())
    }
}

#[async_trait]
impl FallbackFetcher for AlternateClientFetcher {
    async fn fetch_fallback(&self, subject_id: &str) -> Vec<CatalogueEntry> {
        for client in &self.clients {
            debug!(subject = %subject_id, client = client.as_str(), "Trying fallback client");

            match self.fetch_with(*client, subject_id).await {
                Ok(mut entries) if !entries.is_empty() => {
                    entries.truncate(self.limit);
                    FALLBACK_FETCHES
                        .with_label_values(&[client.as_str(), "success"])
                        .inc();
                    debug!(
                        subject = %subject_id,
                        client = client.as_str(),
                        entries = entries.len(),
                        "Fallback client succeeded"
                    );
                    return entries;
                }
                Ok(_) => {
                    FALLBACK_FETCHES
                        .with_label_values(&[client.as_str(), "empty"])
                        .inc();
                    debug!(subject = %subject_id, client = client.as_str(), "Fallback client returned nothing");
                }
                Err(e) => {
                    FALLBACK_FETCHES
                        .with_label_values(&[client.as_str(), "error"])
                        .inc();
                    warn!(subject = %subject_id, client = client.as_str(), error = %e, "Fallback client failed");
                }
            }
        }

        Vec::new()
    }
}

// ============================================================================
// Nav / App API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct NavEnvelope {
    data: Option<NavData>,
}

#[derive(Debug, Deserialize)]
struct NavData {
    wbi_img: Option<WbiImg>,
}

#[derive(Debug, Deserialize)]
struct WbiImg {
    img_url: String,
    sub_url: String,
}

#[derive(Debug, Deserialize)]
struct AppEnvelope {
    code: i64,
    message: Option<String>,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    #[serde(default)]
    item: Vec<AppArchive>,
}

#[derive(Debug, Deserialize)]
struct AppArchive {
    bvid: Option<String>,
    /// Archive id as a string.
    param: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    ctime: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    play: u64,
    #[serde(default)]
    duration: u64,
    author: Option<String>,
}

impl AppArchive {
    fn into_entry(self) -> Option<CatalogueEntry> {
        let id = self.bvid.filter(|b| !b.is_empty())?;
        Some(CatalogueEntry {
            id,
            aid: self.param.and_then(|p| p.parse().ok()),
            title: self.title,
            cover: self.cover,
            created: self.ctime,
            play_count: self.play,
            duration: RawDuration::Seconds(self.duration),
            description: None,
            author: self.author,
            category: None,
        })
    }
}
