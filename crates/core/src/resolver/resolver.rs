//! Multi-strategy playback URL resolution.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::metrics::RESOLUTIONS;
use crate::record::ResolvedPlayback;

use super::metadata::{MetadataClient, VideoMetadata};
use super::quality::{Quality, RelayMode};
use super::relay::RelayProber;
use super::strategy::{PlaybackStrategy, PlaybackTarget, ResolveError};

/// Settled result of one strategy, tagged with its name.
#[derive(Debug)]
pub struct StrategyOutcome {
    pub strategy: String,
    pub result: Result<Option<ResolvedPlayback>, ResolveError>,
}

/// Metadata plus the playback found for it, if any.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    pub metadata: VideoMetadata,
    pub playback: Option<ResolvedPlayback>,
}

/// Pick the first usable playback in priority (list) order.
///
/// Completion order of the strategies has no influence on the choice.
pub fn select_playback(outcomes: Vec<StrategyOutcome>) -> Option<(String, ResolvedPlayback)> {
    outcomes.into_iter().find_map(|outcome| match outcome.result {
        Ok(Some(playback)) if !playback.url.is_empty() => Some((outcome.strategy, playback)),
        _ => None,
    })
}

/// Resolves a video id to a playable URL using every configured strategy.
pub struct PlayUrlResolver {
    metadata: MetadataClient,
    strategies: Vec<Arc<dyn PlaybackStrategy>>,
    relay: RelayProber,
}

impl PlayUrlResolver {
    /// `strategies` are listed highest priority first.
    pub fn new(
        metadata: MetadataClient,
        strategies: Vec<Arc<dyn PlaybackStrategy>>,
        relay: RelayProber,
    ) -> Self {
        Self {
            metadata,
            strategies,
            relay,
        }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve a playback URL, or `None` when metadata or every strategy fails.
    pub async fn resolve(
        &self,
        video_id: &str,
        quality: Quality,
        relay: RelayMode,
    ) -> Option<ResolvedPlayback> {
        match self.resolve_detail(video_id, quality, relay).await {
            Ok(video) => video.playback,
            Err(e) => {
                warn!(video = %video_id, error = %e, "Metadata lookup failed");
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but also returns the metadata.
    ///
    /// Errors only when the metadata lookup itself fails.
    pub async fn resolve_detail(
        &self,
        video_id: &str,
        quality: Quality,
        relay: RelayMode,
    ) -> Result<ResolvedVideo, ResolveError> {
        let metadata = self.metadata.fetch(video_id).await?;
        let playback = self.resolve_target(&metadata.target(), quality, relay).await;
        Ok(ResolvedVideo { metadata, playback })
    }

    /// Run all strategies against known ids, then optionally relay the winner.
    pub async fn resolve_target(
        &self,
        target: &PlaybackTarget,
        quality: Quality,
        relay: RelayMode,
    ) -> Option<ResolvedPlayback> {
        let outcomes = join_all(self.strategies.iter().map(|strategy| async move {
            StrategyOutcome {
                strategy: strategy.name().to_string(),
                result: strategy.resolve(target, quality).await,
            }
        }))
        .await;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(video = %target.bvid, strategy = %outcome.strategy, "Strategy produced nothing")
                }
                Err(e) => {
                    warn!(video = %target.bvid, strategy = %outcome.strategy, error = %e, "Strategy failed")
                }
            }
        }

        let Some((strategy, playback)) = select_playback(outcomes) else {
            RESOLUTIONS.with_label_values(&["none"]).inc();
            warn!(video = %target.bvid, quality = %quality, "All strategies exhausted");
            return None;
        };
        RESOLUTIONS.with_label_values(&[strategy.as_str()]).inc();
        info!(video = %target.bvid, strategy = %strategy, quality = %quality, "Resolved playback");

        if !relay.is_relayed() {
            return Some(playback);
        }

        match self.relay.probe(&playback.url, &playback.headers).await {
            Some(hit) => Some(playback.relayed_through(&hit.relay_base, hit.url)),
            None => Some(playback),
        }
    }
}
