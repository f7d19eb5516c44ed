//! Mock HTTP client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Head,
}

/// A scripted reply for a mocked route.
#[derive(Debug, Clone)]
pub struct MockReply {
    outcome: Result<HttpResponse, HttpError>,
    delay: Option<Duration>,
}

impl MockReply {
    /// 200 with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        Self::text(200, &value.to_string())
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            outcome: Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            delay: None,
        }
    }

    /// Status with an empty body (HEAD probes).
    pub fn status(status: u16) -> Self {
        Self::text(status, "")
    }

    pub fn timeout() -> Self {
        Self::error(HttpError::Timeout)
    }

    pub fn error(error: HttpError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
        }
    }

    /// Sleep before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    prefix: String,
    query: Vec<(String, String)>,
    reply: MockReply,
}

impl Route {
    fn matches(&self, method: Method, request: &HttpRequest) -> bool {
        self.method == method
            && request.url.starts_with(&self.prefix)
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_value(k) == Some(v.as_str()))
    }
}

/// Mock implementation of the HttpClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted replies by URL prefix, optionally narrowed by query parameters
/// - Recorded requests for assertions
/// - Simulated transport failures and delays
///
/// When several routes match, the one with the most query constraints wins;
/// ties go to the most recently registered route.
///
/// # Example
///
/// ```rust,ignore
/// use bilicast_core::testing::{fixtures, MockHttpClient, MockReply};
///
/// let http = MockHttpClient::new();
/// http.on_get(
///     "https://api.bilibili.com/x/space/arc/search",
///     MockReply::json(fixtures::space_page(&["BV1aa"])),
/// ).await;
///
/// // ...exercise code holding `Arc::new(http.clone())`...
///
/// let requests = http.recorded_requests().await;
/// assert_eq!(requests[0].query_value("mid"), Some("42"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<RwLock<Vec<Route>>>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to GET requests whose URL starts with `prefix`.
    pub async fn on_get(&self, prefix: &str, reply: MockReply) {
        self.add_route(Method::Get, prefix, &[], reply).await;
    }

    /// Reply to GET requests matching `prefix` and every given query pair.
    pub async fn on_get_with_query(&self, prefix: &str, query: &[(&str, &str)], reply: MockReply) {
        self.add_route(Method::Get, prefix, query, reply).await;
    }

    /// Reply to HEAD requests whose URL starts with `prefix`.
    pub async fn on_head(&self, prefix: &str, reply: MockReply) {
        self.add_route(Method::Head, prefix, &[], reply).await;
    }

    /// Get all requests made so far, GET and HEAD, in order.
    pub async fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests whose URL starts with `prefix`.
    pub async fn request_count(&self, prefix: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .count()
    }

    /// Remove all routes and recorded requests.
    pub async fn reset(&self) {
        self.routes.write().await.clear();
        self.requests.write().await.clear();
    }

    async fn add_route(&self, method: Method, prefix: &str, query: &[(&str, &str)], reply: MockReply) {
        self.routes.write().await.push(Route {
            method,
            prefix: prefix.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            reply,
        });
    }

    async fn reply_for(
        &self,
        method: Method,
        request: HttpRequest,
    ) -> Result<HttpResponse, HttpError> {
        let reply = {
            let routes = self.routes.read().await;
            routes
                .iter()
                .enumerate()
                .filter(|(_, route)| route.matches(method, &request))
                .max_by_key(|(index, route)| (route.query.len(), *index))
                .map(|(_, route)| route.reply.clone())
        };
        let url = request.url.clone();
        self.requests.write().await.push(request);

        let Some(reply) = reply else {
            return Err(HttpError::Connection(format!(
                "no mock route for {:?} {}",
                method, url
            )));
        };

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.outcome
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.reply_for(Method::Get, request).await
    }

    async fn head(&self, request: HttpRequest) -> Result<u16, HttpError> {
        self.reply_for(Method::Head, request)
            .await
            .map(|response| response.status)
    }
}
