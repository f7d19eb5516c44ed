use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::resolver::Quality;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub enumeration: EnumerationConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Upstream provider endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Web API base (catalogue pages, metadata, playurl).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Native app API base (mobile catalogue fallback).
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    /// Public site base, used for video page links and referers.
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
    /// Uploader space base, used for catalogue page links.
    #[serde(default = "default_space_base_url")]
    pub space_base_url: String,
    /// Default request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            app_base_url: default_app_base_url(),
            web_base_url: default_web_base_url(),
            space_base_url: default_space_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Public page of a single video.
    pub fn video_page_url(&self, video_id: &str) -> String {
        format!("{}/video/{}", self.web_base_url.trim_end_matches('/'), video_id)
    }

    /// Public catalogue page of an uploader.
    pub fn space_page_url(&self, subject_id: &str) -> String {
        format!(
            "{}/{}/video",
            self.space_base_url.trim_end_matches('/'),
            subject_id
        )
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }

    pub fn app_url(&self, path: &str) -> String {
        format!("{}{}", self.app_base_url.trim_end_matches('/'), path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_base_url() -> String {
    "https://api.bilibili.com".to_string()
}

fn default_app_base_url() -> String {
    "https://app.bilibili.com".to_string()
}

fn default_web_base_url() -> String {
    "https://www.bilibili.com".to_string()
}

fn default_space_base_url() -> String {
    "https://space.bilibili.com".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Catalogue pagination bounds and self-throttling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnumerationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Hard cap on pages fetched per enumeration.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Delay between successful page fetches.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Extended delay applied once when the provider reports rate limiting.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    /// Maximum entries kept from a fallback provider.
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            page_delay_ms: default_page_delay_ms(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            fallback_limit: default_fallback_limit(),
        }
    }
}

impl EnumerationConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

fn default_page_size() -> u32 {
    30
}

fn default_max_pages() -> u32 {
    10
}

fn default_page_delay_ms() -> u64 {
    300
}

fn default_rate_limit_delay_ms() -> u64 {
    3000
}

fn default_fallback_limit() -> usize {
    20
}

/// Playback resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Relay bases, probed in order. The encoded media URL is appended.
    #[serde(default)]
    pub relays: Vec<String>,
    /// Timeout for each relay existence check.
    #[serde(default = "default_relay_timeout_ms")]
    pub relay_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            relays: Vec::new(),
            relay_timeout_ms: default_relay_timeout_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }
}

fn default_relay_timeout_ms() -> u64 {
    3000
}

/// Result cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_cache_capacity() -> usize {
    64
}

fn default_cache_ttl_secs() -> u64 {
    600
}

/// Pipeline bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Maximum catalogue entries resolved per request.
    #[serde(default = "default_max_processed")]
    pub max_processed: usize,
    /// Quality used when a request does not name one.
    #[serde(default)]
    pub default_quality: Quality,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_processed: default_max_processed(),
            default_quality: Quality::default(),
        }
    }
}

fn default_max_processed() -> usize {
    20
}

/// Sanitized config for API responses (relay endpoints hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub enumeration: EnumerationConfig,
    pub resolver: SanitizedResolverConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedResolverConfig {
    pub relays_configured: usize,
    pub relay_timeout_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            provider: config.provider.clone(),
            enumeration: config.enumeration.clone(),
            resolver: SanitizedResolverConfig {
                relays_configured: config.resolver.relays.len(),
                relay_timeout_ms: config.resolver.relay_timeout_ms,
            },
            cache: config.cache.clone(),
            pipeline: config.pipeline.clone(),
        }
    }
}
