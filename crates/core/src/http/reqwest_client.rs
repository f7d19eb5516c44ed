//! `reqwest`-backed implementation of [`HttpClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, RequestBuilder};
use tracing::debug;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Production HTTP client.
///
/// Holds two connection pools: one that follows redirects for API calls and
/// one that does not, so HEAD probes can observe 3xx statuses directly.
pub struct ReqwestHttpClient {
    client: Client,
    probe_client: Client,
}

impl ReqwestHttpClient {
    /// Create a client with the given default request timeout.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder().timeout(timeout).cookie_store(true).build()?;
        let probe_client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            probe_client,
        })
    }

    fn prepare(builder: RequestBuilder, request: &HttpRequest) -> RequestBuilder {
        let mut builder = builder.query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        debug!(url = %request.url, "GET");

        let response = Self::prepare(self.client.get(&request.url), &request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| HttpError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }

    async fn head(&self, request: HttpRequest) -> Result<u16, HttpError> {
        debug!(url = %request.url, "HEAD");

        let response = Self::prepare(self.probe_client.head(&request.url), &request)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}
