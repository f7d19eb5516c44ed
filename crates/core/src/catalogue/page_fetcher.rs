//! Primary catalogue page fetcher (uploader space search endpoint).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::http::{HttpClient, HttpRequest, HttpResponse, DESKTOP_USER_AGENT};

use super::types::{lenient_u64, CatalogueEntry, CatalogueError, RawDuration};

/// Fetches one page of a subject's catalogue.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page` (1-based) with `page_size` entries per page.
    async fn fetch_page(
        &self,
        subject_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<CatalogueEntry>, CatalogueError>;
}

/// Page fetcher backed by the web space search API.
pub struct SpacePageFetcher {
    http: Arc<dyn HttpClient>,
    provider: ProviderConfig,
}

impl SpacePageFetcher {
    pub fn new(http: Arc<dyn HttpClient>, provider: ProviderConfig) -> Self {
        Self { http, provider }
    }
}

#[async_trait]
impl PageFetcher for SpacePageFetcher {
    async fn fetch_page(
        &self,
        subject_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<CatalogueEntry>, CatalogueError> {
        debug!(subject = %subject_id, page, page_size, "Fetching catalogue page");

        let request = HttpRequest::new(self.provider.api_url("/x/space/arc/search"))
            .query("mid", subject_id)
            .query("ps", page_size)
            .query("pn", page)
            .query("order", "pubdate")
            .header("User-Agent", DESKTOP_USER_AGENT)
            .header(
                "Referer",
                format!(
                    "{}/{}",
                    self.provider.space_base_url.trim_end_matches('/'),
                    subject_id
                ),
            );

        let response = self.http.get(request).await?;
        parse_space_response(&response)
    }
}

/// Parse a space search response, shared by the plain and signed endpoints.
pub(super) fn parse_space_response(
    response: &HttpResponse,
) -> Result<Vec<CatalogueEntry>, CatalogueError> {
    let envelope: SpaceEnvelope = response.json().map_err(|e| {
        CatalogueError::Parse(format!(
            "HTTP {}: invalid space search body: {}",
            response.status, e
        ))
    })?;

    if envelope.code != 0 {
        return Err(CatalogueError::Upstream {
            code: envelope.code,
            message: envelope.message.unwrap_or_default(),
        });
    }

    let vlist = envelope
        .data
        .and_then(|d| d.list)
        .map(|l| l.vlist)
        .unwrap_or_default();

    Ok(vlist.into_iter().map(CatalogueEntry::from).collect())
}

// ============================================================================
// Space API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SpaceEnvelope {
    code: i64,
    message: Option<String>,
    data: Option<SpaceData>,
}

#[derive(Debug, Deserialize)]
struct SpaceData {
    list: Option<SpaceList>,
}

#[derive(Debug, Deserialize)]
struct SpaceList {
    #[serde(default)]
    vlist: Vec<SpaceVideo>,
}

#[derive(Debug, Deserialize)]
struct SpaceVideo {
    bvid: String,
    aid: Option<u64>,
    title: String,
    #[serde(default)]
    pic: String,
    #[serde(default)]
    created: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    play: u64,
    #[serde(default)]
    length: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

impl From<SpaceVideo> for CatalogueEntry {
    fn from(v: SpaceVideo) -> Self {
        Self {
            id: v.bvid,
            aid: v.aid,
            title: v.title,
            cover: v.pic,
            created: v.created,
            play_count: v.play,
            duration: v
                .length
                .map(RawDuration::Text)
                .unwrap_or_default(),
            description: v.description.filter(|d| !d.is_empty()),
            author: v.author,
            category: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockHttpClient, MockReply};

    fn fetcher(mock: &MockHttpClient) -> SpacePageFetcher {
        SpacePageFetcher::new(Arc::new(mock.clone()), ProviderConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_page_parses_entries() {
        let mock = MockHttpClient::new();
        mock.on_get(
            "https://api.bilibili.com/x/space/arc/search",
            MockReply::json(fixtures::space_page(&["BV1aa", "BV1bb"])),
        )
        .await;

        let entries = fetcher(&mock).fetch_page("42", 1, 30).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "BV1aa");
        assert_eq!(entries[0].duration, RawDuration::Text("03:25".to_string()));
        assert_eq!(entries[1].play_count, 12_000);

        let recorded = mock.recorded_requests().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].query_value("mid"), Some("42"));
        assert_eq!(recorded[0].query_value("pn"), Some("1"));
        assert_eq!(recorded[0].query_value("ps"), Some("30"));
        assert_eq!(
            recorded[0].header_value("Referer"),
            Some("https://space.bilibili.com/42")
        );
    }

    #[tokio::test]
    async fn test_fetch_page_upstream_code() {
        let mock = MockHttpClient::new();
        mock.on_get(
            "https://api.bilibili.com/x/space/arc/search",
            MockReply::json(fixtures::error_envelope(-352, "risk control")),
        )
        .await;

        let err = fetcher(&mock).fetch_page("42", 1, 30).await.unwrap_err();
        match err {
            CatalogueError::Upstream { code, message } => {
                assert_eq!(code, -352);
                assert_eq!(message, "risk control");
            }
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_malformed_body() {
        let mock = MockHttpClient::new();
        mock.on_get(
            "https://api.bilibili.com/x/space/arc/search",
            MockReply::text(502, "<html>Bad Gateway</html>"),
        )
        .await;

        let err = fetcher(&mock).fetch_page("42", 1, 30).await.unwrap_err();
        assert!(matches!(err, CatalogueError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_transport_error() {
        let mock = MockHttpClient::new();
        mock.on_get(
            "https://api.bilibili.com/x/space/arc/search",
            MockReply::timeout(),
        )
        .await;

        let err = fetcher(&mock).fetch_page("42", 1, 30).await.unwrap_err();
        assert!(matches!(err, CatalogueError::Transport(_)));
    }

    #[test]
    fn test_parse_space_response_missing_list_is_empty() {
        let response = HttpResponse {
            status: 200,
            body: r#"{"code":0,"message":"0","data":{"list":null}}"#.to_string(),
        };
        assert!(parse_space_response(&response).unwrap().is_empty());
    }
}
