//! Catalogue enumeration for an uploader's videos.
//!
//! - [`PageFetcher`]: one page from the primary space search endpoint
//! - [`FallbackFetcher`]: alternate client identities when the primary is blocked
//! - [`CatalogueEnumerator`]: sequential pagination with throttling and fallback

mod enumerator;
mod fallback;
mod page_fetcher;
mod types;
pub mod wbi;

pub use enumerator::CatalogueEnumerator;
pub use fallback::{AlternateClient, AlternateClientFetcher, FallbackFetcher};
pub use page_fetcher::{PageFetcher, SpacePageFetcher};
pub use types::{CatalogueEntry, CatalogueError, RawDuration, UpstreamCode};

pub(crate) use types::lenient_u64;
