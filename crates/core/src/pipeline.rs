//! End-to-end pipeline: enumerate, resolve, map, cache.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::catalogue::{
    AlternateClientFetcher, CatalogueEntry, CatalogueEnumerator, FallbackFetcher, PageFetcher,
    SpacePageFetcher,
};
use crate::config::{Config, PipelineConfig, ProviderConfig};
use crate::feed::{extract_video_id, FeedError};
use crate::http::HttpClient;
use crate::metrics::PIPELINE_DURATION;
use crate::record::{
    error_record, map_entry, more_results_record, no_results_record, with_playback, MediaRecord,
};
use crate::resolver::{
    DesktopStrategy, MetadataClient, MobileStrategy, PlayUrlResolver, PlaybackStrategy, Quality,
    RelayMode, RelayProber, ThirdPartyStrategy,
};

/// Orchestrates catalogue enumeration and per-video resolution.
pub struct PlaybackPipeline {
    enumerator: CatalogueEnumerator,
    resolver: PlayUrlResolver,
    cache: ResultCache,
    provider: ProviderConfig,
    config: PipelineConfig,
}

impl PlaybackPipeline {
    pub fn new(
        enumerator: CatalogueEnumerator,
        resolver: PlayUrlResolver,
        cache: ResultCache,
        provider: ProviderConfig,
        config: PipelineConfig,
    ) -> Self {
        Self {
            enumerator,
            resolver,
            cache,
            provider,
            config,
        }
    }

    /// Wire the default fetchers and strategies over one HTTP client.
    pub fn from_config(http: Arc<dyn HttpClient>, config: &Config) -> Self {
        let provider = config.provider.clone();

        let pages: Arc<dyn PageFetcher> =
            Arc::new(SpacePageFetcher::new(http.clone(), provider.clone()));
        let fallback: Arc<dyn FallbackFetcher> = Arc::new(AlternateClientFetcher::new(
            http.clone(),
            provider.clone(),
            config.enumeration.fallback_limit,
        ));
        let enumerator = CatalogueEnumerator::new(pages, fallback, config.enumeration.clone());

        let strategies: Vec<Arc<dyn PlaybackStrategy>> = vec![
            Arc::new(DesktopStrategy::new(http.clone(), provider.clone())),
            Arc::new(MobileStrategy::new(http.clone(), provider.clone())),
            Arc::new(ThirdPartyStrategy),
        ];
        let resolver = PlayUrlResolver::new(
            MetadataClient::new(http.clone(), provider.clone()),
            strategies,
            RelayProber::new(http, &config.resolver),
        );

        Self::new(
            enumerator,
            resolver,
            ResultCache::from_config(&config.cache),
            provider,
            config.pipeline.clone(),
        )
    }

    /// Quality used when a caller does not ask for one.
    pub fn default_quality(&self) -> Quality {
        self.config.default_quality
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Playable (or link) records for an uploader's catalogue.
    ///
    /// Always returns a renderable list: an empty catalogue yields one
    /// "no results" record and a failed enumeration one error record.
    pub async fn load_user_videos(
        &self,
        subject_id: &str,
        quality: Quality,
        relay: RelayMode,
    ) -> Vec<MediaRecord> {
        let start = Instant::now();
        let key = CacheKey::new(subject_id, quality);

        if let Some(cached) = self.cache.get(&key).await {
            info!(subject = %subject_id, quality = %quality, count = cached.len(), "Serving cached records");
            PIPELINE_DURATION
                .with_label_values(&["cache"])
                .observe(start.elapsed().as_secs_f64());
            return cached;
        }

        let entries = match self.enumerator.enumerate(subject_id).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(subject = %subject_id, error = %e, "Catalogue enumeration failed");
                return vec![error_record(
                    subject_id,
                    &format!("Could not load the catalogue: {}", e),
                    &self.provider,
                )];
            }
        };

        let records = if entries.is_empty() {
            vec![no_results_record(subject_id, &self.provider)]
        } else {
            let cap = self.config.max_processed;
            let mut records = Vec::with_capacity(entries.len().min(cap) + 1);

            for entry in entries.iter().take(cap) {
                let record = map_entry(entry, &self.provider);
                match self.resolver.resolve(&entry.id, quality, relay).await {
                    Some(playback) => records.push(with_playback(record, playback)),
                    None => {
                        warn!(subject = %subject_id, video = %entry.id, "Falling back to link record");
                        records.push(record);
                    }
                }
            }

            if entries.len() > cap {
                records.push(more_results_record(
                    subject_id,
                    entries.len() - cap,
                    &self.provider,
                ));
            }
            records
        };

        info!(
            subject = %subject_id,
            quality = %quality,
            count = records.len(),
            playable = records.iter().filter(|r| r.is_video()).count(),
            "Pipeline finished"
        );
        self.cache.put(key, records.clone()).await;
        PIPELINE_DURATION
            .with_label_values(&["fresh"])
            .observe(start.elapsed().as_secs_f64());
        records
    }

    /// Resolve a single video from its id or page link.
    pub async fn load_detail(
        &self,
        link: &str,
        quality: Quality,
        relay: RelayMode,
    ) -> Result<MediaRecord, FeedError> {
        let video_id = extract_video_id(link)?;
        let video = self
            .resolver
            .resolve_detail(&video_id, quality, relay)
            .await?;

        let record = map_entry(&CatalogueEntry::from(&video.metadata), &self.provider);
        Ok(match video.playback {
            Some(playback) => with_playback(record, playback),
            None => {
                warn!(video = %video_id, "No playback URL, returning link record");
                record
            }
        })
    }
}
