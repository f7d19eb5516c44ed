//! Mock playback strategy for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::record::ResolvedPlayback;
use crate::resolver::{PlaybackStrategy, PlaybackTarget, Quality, ResolveError};

/// Mock implementation of the PlaybackStrategy trait.
///
/// Returns a fixed outcome, optionally after a delay, and records each call.
#[derive(Debug, Clone)]
pub struct MockStrategy {
    name: String,
    outcome: Result<Option<ResolvedPlayback>, ResolveError>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<(PlaybackTarget, Quality)>>>,
}

impl MockStrategy {
    fn with_outcome(
        name: &str,
        outcome: Result<Option<ResolvedPlayback>, ResolveError>,
    ) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Always resolves to `url` with placeholder headers.
    pub fn success(name: &str, url: &str) -> Self {
        Self::with_outcome(
            name,
            Ok(Some(ResolvedPlayback::new(
                url,
                "https://www.bilibili.com",
                "mock-agent",
            ))),
        )
    }

    /// Runs but never finds anything.
    pub fn empty(name: &str) -> Self {
        Self::with_outcome(name, Ok(None))
    }

    pub fn failure(name: &str, error: ResolveError) -> Self {
        Self::with_outcome(name, Err(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn calls(&self) -> Vec<(PlaybackTarget, Quality)> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl PlaybackStrategy for MockStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        target: &PlaybackTarget,
        quality: Quality,
    ) -> Result<Option<ResolvedPlayback>, ResolveError> {
        self.calls.write().await.push((target.clone(), quality));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
