//! Common test utilities for E2E testing with mocks.
//!
//! The fixture builds the real router over a scripted [`MockHttpClient`],
//! so every request path runs through the wired pipeline and feed client
//! without touching the network.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bilicast_core::{load_config, testing::MockHttpClient, FeedClient, PlaybackPipeline};
use bilicast_server::state::AppState;

/// Re-export fixtures for test convenience
pub use bilicast_core::testing::{fixtures, MockReply};

pub const SPACE: &str = "https://api.bilibili.com/x/space/arc/search";
pub const VIEW: &str = "https://api.bilibili.com/x/web-interface/view";
pub const PLAYURL: &str = "https://api.bilibili.com/x/player/playurl";
pub const SEARCH: &str = "https://api.bilibili.com/x/web-interface/search/type";
pub const POPULAR: &str = "https://api.bilibili.com/x/web-interface/popular";
pub const NEWLIST: &str = "https://api.bilibili.com/x/web-interface/newlist";
pub const RELAY: &str = "https://relay.example.com/";

/// Settings that keep enumeration from sleeping between pages.
const BASE_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[enumeration]
page_delay_ms = 0
rate_limit_delay_ms = 0
"#;

/// Test fixture for E2E testing with a scripted upstream.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_popular_feed() {
///     let fixture = TestFixture::new().await;
///     fixture
///         .http
///         .on_get(POPULAR, MockReply::json(fixtures::archive_list("list", &["BV1a"])))
///         .await;
///
///     let response = fixture.get("/api/v1/feeds/popular").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Scripted upstream shared by the pipeline and feed client
    pub http: MockHttpClient,
    /// Holds the config file for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config("").await
    }

    /// Create a test fixture with extra TOML appended to the base config.
    pub async fn with_config(extra: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, format!("{}\n{}", BASE_CONFIG, extra))
            .expect("Failed to write config");
        let config = load_config(&config_path).expect("Failed to load config");

        let http = MockHttpClient::new();
        let pipeline = Arc::new(PlaybackPipeline::from_config(
            Arc::new(http.clone()),
            &config,
        ));
        let feeds = Arc::new(FeedClient::new(
            Arc::new(http.clone()),
            config.provider.clone(),
        ));

        let state = Arc::new(AppState::new(config, pipeline, feeds));
        let router = bilicast_server::api::create_router(state);

        Self {
            router,
            http,
            temp_dir,
        }
    }

    /// Script view and desktop playurl responses for each id.
    pub async fn script_videos(&self, ids: &[&str], media_url: &str) {
        for (i, id) in ids.iter().enumerate() {
            self.http
                .on_get_with_query(
                    VIEW,
                    &[("bvid", *id)],
                    MockReply::json(fixtures::view(id, 9000 + i as u64)),
                )
                .await;
        }
        self.http
            .on_get(PLAYURL, MockReply::json(fixtures::playurl(media_url)))
            .await;
    }

    /// Script a single-page uploader catalogue.
    pub async fn script_catalogue(&self, ids: &[&str]) {
        self.http
            .on_get_with_query(
                SPACE,
                &[("pn", "1")],
                MockReply::json(fixtures::space_page(ids)),
            )
            .await;
        self.http
            .on_get_with_query(SPACE, &[("pn", "2")], MockReply::json(fixtures::space_page(&[])))
            .await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
