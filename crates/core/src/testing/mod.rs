//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the HTTP capability and of
//! playback strategies, so the whole pipeline can be exercised without
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use bilicast_core::testing::{fixtures, MockHttpClient, MockReply};
//!
//! let http = MockHttpClient::new();
//! http.on_get(
//!     "https://api.bilibili.com/x/web-interface/view",
//!     MockReply::json(fixtures::view("BV1aa", 1001)),
//! ).await;
//!
//! let pipeline = PlaybackPipeline::from_config(Arc::new(http.clone()), &config);
//! ```

mod mock_http;
mod mock_strategy;

pub use mock_http::{MockHttpClient, MockReply};
pub use mock_strategy::MockStrategy;

/// Test fixtures and helper functions.
///
/// JSON builders mirror the provider's response envelopes.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::catalogue::{CatalogueEntry, RawDuration};

    /// Image key published by the nav endpoint in [`nav_keys`].
    pub const WBI_IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
    /// Sub key published by the nav endpoint in [`nav_keys`].
    pub const WBI_SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";

    /// Create a catalogue entry with reasonable defaults.
    pub fn entry(id: &str) -> CatalogueEntry {
        CatalogueEntry {
            id: id.to_string(),
            aid: None,
            title: format!("Video {}", id),
            cover: format!("//i0.hdslb.com/bfs/archive/{}.jpg", id),
            created: 1_700_000_000,
            play_count: 1_234,
            duration: RawDuration::Seconds(205),
            description: Some(format!("About {}", id)),
            author: Some("uploader".to_string()),
            category: None,
        }
    }

    pub fn entries(ids: &[&str]) -> Vec<CatalogueEntry> {
        ids.iter().map(|id| entry(id)).collect()
    }

    /// Provider error envelope.
    pub fn error_envelope(code: i64, message: &str) -> Value {
        json!({"code": code, "message": message, "ttl": 1})
    }

    /// Space search page. The second entry has 12,000 plays.
    pub fn space_page(ids: &[&str]) -> Value {
        let vlist: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "aid": 170_000 + i as u64,
                    "bvid": id,
                    "title": format!("Video {}", id),
                    "pic": format!("//i0.hdslb.com/bfs/archive/{}.jpg", id),
                    "created": 1_700_000_000 - (i as i64) * 86_400,
                    "play": if i == 1 { 12_000 } else { 800 },
                    "length": "03:25",
                    "description": "",
                    "author": "uploader"
                })
            })
            .collect();

        json!({
            "code": 0,
            "message": "0",
            "data": {
                "list": {"vlist": vlist},
                "page": {"pn": 1, "ps": 30, "count": ids.len()}
            }
        })
    }

    /// Nav response for a logged-out client carrying the signing keys.
    pub fn nav_keys() -> Value {
        json!({
            "code": -101,
            "message": "账号未登录",
            "data": {
                "isLogin": false,
                "wbi_img": {
                    "img_url": format!("https://i0.hdslb.com/bfs/wbi/{}.png", WBI_IMG_KEY),
                    "sub_url": format!("https://i0.hdslb.com/bfs/wbi/{}.png", WBI_SUB_KEY)
                }
            }
        })
    }

    /// App archive cursor page. Every item lasts 205 seconds.
    pub fn app_archive(ids: &[&str]) -> Value {
        let items: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "param": (170_000 + i as u64).to_string(),
                    "bvid": id,
                    "title": format!("Video {}", id),
                    "cover": format!("http://i0.hdslb.com/bfs/archive/{}.jpg", id),
                    "ctime": 1_700_000_000 - (i as i64) * 86_400,
                    "play": 800,
                    "duration": 205,
                    "author": "uploader"
                })
            })
            .collect();

        json!({"code": 0, "message": "0", "data": {"item": items, "has_next": false}})
    }

    /// View response for a single video.
    pub fn view(bvid: &str, cid: u64) -> Value {
        json!({
            "code": 0,
            "message": "0",
            "data": {
                "bvid": bvid,
                "aid": 170_001,
                "cid": cid,
                "title": format!("Video {}", bvid),
                "pic": format!("http://i0.hdslb.com/bfs/archive/{}.jpg", bvid),
                "pubdate": 1_700_000_000,
                "duration": 3_725,
                "desc": format!("About {}", bvid),
                "tname": "科技",
                "owner": {"mid": 42, "name": "uploader"},
                "stat": {"view": 250_000}
            }
        })
    }

    /// Playurl response with one segment and one backup (`?backup=1`).
    pub fn playurl(url: &str) -> Value {
        json!({
            "code": 0,
            "message": "0",
            "data": {
                "quality": 80,
                "durl": [{
                    "order": 1,
                    "url": url,
                    "backup_url": [format!("{}?backup=1", url)]
                }]
            }
        })
    }

    /// Popular/category style archive list under `field`.
    pub fn archive_list(field: &str, ids: &[&str]) -> Value {
        let archives: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "aid": 170_000 + i as u64,
                    "bvid": id,
                    "title": format!("Video {}", id),
                    "pic": format!("http://i0.hdslb.com/bfs/archive/{}.jpg", id),
                    "pubdate": 1_700_000_000,
                    "duration": 600,
                    "desc": "",
                    "tname": "生活",
                    "owner": {"mid": 42, "name": "uploader"},
                    "stat": {"view": 150_000}
                })
            })
            .collect();

        let mut data = serde_json::Map::new();
        data.insert(field.to_string(), Value::Array(archives));
        json!({"code": 0, "message": "0", "data": data})
    }
}
