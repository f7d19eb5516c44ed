//! Sequential, self-throttled enumeration of an uploader's catalogue.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EnumerationConfig;
use crate::metrics::CATALOGUE_PAGES;

use super::fallback::FallbackFetcher;
use super::page_fetcher::PageFetcher;
use super::types::{CatalogueEntry, CatalogueError, UpstreamCode};

/// Drives a [`PageFetcher`] across pages until exhaustion or the page cap.
pub struct CatalogueEnumerator {
    pages: Arc<dyn PageFetcher>,
    fallback: Arc<dyn FallbackFetcher>,
    config: EnumerationConfig,
}

impl CatalogueEnumerator {
    pub fn new(
        pages: Arc<dyn PageFetcher>,
        fallback: Arc<dyn FallbackFetcher>,
        config: EnumerationConfig,
    ) -> Self {
        Self {
            pages,
            fallback,
            config,
        }
    }

    /// Enumerate the subject's catalogue in provider order.
    ///
    /// Provider rejections end enumeration with whatever was gathered so far.
    /// Only a transport failure on the first page, with no fallback data,
    /// is returned as an error.
    pub async fn enumerate(&self, subject_id: &str) -> Result<Vec<CatalogueEntry>, CatalogueError> {
        let mut entries = Vec::new();
        let max_pages = self.config.max_pages;

        for page in 1..=max_pages {
            match self
                .pages
                .fetch_page(subject_id, page, self.config.page_size)
                .await
            {
                Ok(batch) if batch.is_empty() => {
                    CATALOGUE_PAGES.with_label_values(&["empty"]).inc();
                    debug!(subject = %subject_id, page, "Reached end of catalogue");
                    break;
                }
                Ok(batch) => {
                    CATALOGUE_PAGES.with_label_values(&["ok"]).inc();
                    debug!(subject = %subject_id, page, count = batch.len(), "Fetched catalogue page");
                    entries.extend(batch);
                    if page < max_pages {
                        tokio::time::sleep(self.config.page_delay()).await;
                    }
                }
                Err(e) => match e.upstream_code() {
                    Some(code) if code.is_recoverable() => {
                        CATALOGUE_PAGES.with_label_values(&["throttled"]).inc();
                        warn!(subject = %subject_id, page, error = %e, "Catalogue request throttled");

                        if code == UpstreamCode::RateLimited {
                            tokio::time::sleep(self.config.rate_limit_delay()).await;
                        }
                        if page == 1 {
                            let fallback = self.fallback.fetch_fallback(subject_id).await;
                            if !fallback.is_empty() {
                                info!(
                                    subject = %subject_id,
                                    count = fallback.len(),
                                    "Using fallback catalogue"
                                );
                                return Ok(fallback);
                            }
                        }
                        break;
                    }
                    _ if page == 1 && matches!(e, CatalogueError::Transport(_)) => {
                        CATALOGUE_PAGES.with_label_values(&["transport_error"]).inc();
                        warn!(subject = %subject_id, error = %e, "First catalogue page unreachable, trying fallback");

                        let fallback = self.fallback.fetch_fallback(subject_id).await;
                        if fallback.is_empty() {
                            return Err(e);
                        }
                        return Ok(fallback);
                    }
                    _ => {
                        CATALOGUE_PAGES.with_label_values(&["error"]).inc();
                        warn!(subject = %subject_id, page, error = %e, "Stopping enumeration on page error");
                        break;
                    }
                },
            }
        }

        info!(subject = %subject_id, count = entries.len(), "Catalogue enumerated");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use crate::testing::fixtures;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Mutex;

    type PageResult = Result<Vec<CatalogueEntry>, CatalogueError>;

    /// Serves scripted pages in order; empty once the script runs out.
    struct ScriptedPages {
        pages: Mutex<VecDeque<PageResult>>,
        requested: Mutex<Vec<u32>>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<PageResult>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedPages {
        async fn fetch_page(&self, _subject: &str, page: u32, _size: u32) -> PageResult {
            self.requested.lock().await.push(page);
            self.pages.lock().await.pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    struct FixedFallback {
        entries: Vec<CatalogueEntry>,
        calls: Mutex<u32>,
    }

    impl FixedFallback {
        fn new(ids: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                entries: fixtures::entries(ids),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl FallbackFetcher for FixedFallback {
        async fn fetch_fallback(&self, _subject: &str) -> Vec<CatalogueEntry> {
            *self.calls.lock().await += 1;
            self.entries.clone()
        }
    }

    fn upstream(code: i64) -> CatalogueError {
        CatalogueError::Upstream {
            code,
            message: "rejected".to_string(),
        }
    }

    fn enumerator(
        pages: Arc<ScriptedPages>,
        fallback: Arc<FixedFallback>,
        max_pages: u32,
    ) -> CatalogueEnumerator {
        CatalogueEnumerator::new(
            pages,
            fallback,
            EnumerationConfig {
                max_pages,
                ..Default::default()
            },
        )
    }

    fn ids(entries: &[CatalogueEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_empty_page() {
        let pages = ScriptedPages::new(vec![
            Ok(fixtures::entries(&["a", "b"])),
            Ok(fixtures::entries(&["c"])),
            Ok(Vec::new()),
        ]);
        let result = enumerator(pages.clone(), FixedFallback::new(&[]), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["a", "b", "c"]);
        assert_eq!(*pages.requested.lock().await, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respects_page_cap() {
        let pages = ScriptedPages::new(
            (0..5)
                .map(|i| Ok(fixtures::entries(&[format!("v{}", i).as_str()])))
                .collect(),
        );
        let result = enumerator(pages.clone(), FixedFallback::new(&[]), 3)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(*pages.requested.lock().await, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_applies_inter_page_delay() {
        let pages = ScriptedPages::new(vec![
            Ok(fixtures::entries(&["a"])),
            Ok(fixtures::entries(&["b"])),
        ]);
        let start = tokio::time::Instant::now();
        enumerator(pages, FixedFallback::new(&[]), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_first_page_uses_fallback() {
        let pages = ScriptedPages::new(vec![Err(upstream(-412))]);
        let fallback = FixedFallback::new(&["f1", "f2"]);
        let start = tokio::time::Instant::now();

        let result = enumerator(pages.clone(), fallback.clone(), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["f1", "f2"]);
        assert_eq!(*fallback.calls.lock().await, 1);
        assert_eq!(*pages.requested.lock().await, vec![1]);
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verification_first_page_uses_fallback() {
        let pages = ScriptedPages::new(vec![Err(upstream(-352))]);
        let result = enumerator(pages, FixedFallback::new(&["f1"]), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["f1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_later_page_returns_partial() {
        let pages = ScriptedPages::new(vec![
            Ok(fixtures::entries(&["a", "b"])),
            Err(upstream(-799)),
            Ok(fixtures::entries(&["never"])),
        ]);
        let fallback = FixedFallback::new(&["f1"]);

        let result = enumerator(pages.clone(), fallback.clone(), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["a", "b"]);
        assert_eq!(*fallback.calls.lock().await, 0);
        assert_eq!(*pages.requested.lock().await, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_with_empty_fallback_is_empty_success() {
        let pages = ScriptedPages::new(vec![Err(upstream(-412))]);
        let result = enumerator(pages, FixedFallback::new(&[]), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_first_page_without_fallback_errors() {
        let pages = ScriptedPages::new(vec![Err(CatalogueError::Transport(HttpError::Timeout))]);
        let err = enumerator(pages, FixedFallback::new(&[]), 10)
            .enumerate("1")
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogueError::Transport(HttpError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_first_page_with_fallback() {
        let pages = ScriptedPages::new(vec![Err(CatalogueError::Transport(HttpError::Timeout))]);
        let result = enumerator(pages, FixedFallback::new(&["f1"]), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["f1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_later_page_returns_partial() {
        let pages = ScriptedPages::new(vec![
            Ok(fixtures::entries(&["a"])),
            Err(CatalogueError::Transport(HttpError::Connection("reset".to_string()))),
        ]);
        let result = enumerator(pages, FixedFallback::new(&["f1"]), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_recoverable_code_stops_without_fallback() {
        let pages = ScriptedPages::new(vec![Err(upstream(-404))]);
        let fallback = FixedFallback::new(&["f1"]);
        let result = enumerator(pages, fallback.clone(), 10)
            .enumerate("1")
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(*fallback.calls.lock().await, 0);
    }
}
