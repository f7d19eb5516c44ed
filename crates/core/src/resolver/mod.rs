//! Playback URL resolution.
//!
//! A [`PlayUrlResolver`] fetches video metadata, runs every
//! [`PlaybackStrategy`] concurrently, selects the highest-priority usable
//! result, and optionally rewrites it through a relay.

mod metadata;
mod quality;
mod relay;
#[allow(clippy::module_inception)]
mod resolver;
mod strategy;

pub use metadata::{MetadataClient, VideoMetadata};
pub use quality::{Quality, RelayMode};
pub use relay::{RelayProber, RelayedUrl};
pub use resolver::{select_playback, PlayUrlResolver, ResolvedVideo, StrategyOutcome};
pub use strategy::{
    DesktopStrategy, MobileStrategy, PlaybackStrategy, PlaybackTarget, ResolveError,
    ThirdPartyStrategy,
};
