//! HTTP capability shared by every upstream-facing component.
//!
//! The core never talks to `reqwest` directly: page fetchers, strategies and
//! the relay prober all receive an `Arc<dyn HttpClient>`, which lets tests
//! script upstream behaviour with `testing::MockHttpClient`.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Desktop browser identity used for web endpoints.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Mobile browser identity used for the html5 playback variant.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

/// Native app identity used for the app API.
pub const APP_USER_AGENT: &str =
    "Mozilla/5.0 BiliDroid/7.80.0 (bbcallen@gmail.com) os/android model/Pixel 7 mobi_app/android build/7800300";

/// Transport-level failures.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else if e.is_connect() {
            HttpError::Connection(e.to_string())
        } else if e.is_body() || e.is_decode() {
            HttpError::Body(e.to_string())
        } else {
            HttpError::Request(e.to_string())
        }
    }
}

/// A GET or HEAD request description.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// URL without query string.
    pub url: String,
    /// Query parameters, in insertion order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Per-request timeout overriding the client default.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, value) in headers {
            self.headers.push((name.clone(), value.clone()));
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of a query parameter, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a header (case-insensitive name), if present.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Minimal HTTP client the core depends on.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET request and return the status and body.
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Issue a HEAD request without following redirects and return the status.
    async fn head(&self, request: HttpRequest) -> Result<u16, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::new("https://api.example.com/x")
            .query("mid", 42)
            .query("pn", "1")
            .header("Referer", "https://example.com")
            .timeout(Duration::from_secs(2));

        assert_eq!(request.query_value("mid"), Some("42"));
        assert_eq!(request.query_value("pn"), Some("1"));
        assert_eq!(request.query_value("ps"), None);
        assert_eq!(request.header_value("referer"), Some("https://example.com"));
        assert_eq!(request.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_response_json_and_status() {
        let response = HttpResponse {
            status: 200,
            body: r#"{"code":0}"#.to_string(),
        };
        assert!(response.is_success());
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["code"], 0);

        let response = HttpResponse {
            status: 302,
            body: String::new(),
        };
        assert!(!response.is_success());
    }
}
