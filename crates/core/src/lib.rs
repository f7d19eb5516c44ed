pub mod cache;
pub mod catalogue;
pub mod config;
pub mod feed;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod testing;

pub use cache::{CacheKey, ResultCache};
pub use catalogue::{
    AlternateClientFetcher, CatalogueEntry, CatalogueEnumerator, CatalogueError, FallbackFetcher,
    PageFetcher, RawDuration, SpacePageFetcher, UpstreamCode,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use feed::{extract_video_id, FeedClient, FeedError};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use pipeline::PlaybackPipeline;
pub use record::{MediaRecord, RecordContent, RelayInfo, ResolvedPlayback};
pub use resolver::{
    DesktopStrategy, MobileStrategy, PlayUrlResolver, PlaybackStrategy, PlaybackTarget, Quality,
    RelayMode, RelayProber, ResolveError, ThirdPartyStrategy,
};
