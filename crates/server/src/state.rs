use std::sync::Arc;
use bilicast_core::{Config, FeedClient, PlaybackPipeline, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<PlaybackPipeline>,
    feeds: Arc<FeedClient>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<PlaybackPipeline>, feeds: Arc<FeedClient>) -> Self {
        Self {
            config,
            pipeline,
            feeds,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &PlaybackPipeline {
        self.pipeline.as_ref()
    }

    pub fn feeds(&self) -> &FeedClient {
        self.feeds.as_ref()
    }
}
