//! Output records and the pure mapping from catalogue entries.

mod mapper;
mod types;

pub use mapper::{
    backdrop_url, error_record, format_date, format_duration, format_play_count, format_rating,
    map_entry, more_results_record, no_results_record, poster_url, strip_html_tags,
    with_playback,
};
pub use types::{MediaRecord, RecordContent, RelayInfo, ResolvedPlayback};
