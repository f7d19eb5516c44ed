//! Bounded, time-boxed memoization of pipeline output.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::metrics::CACHE_LOOKUPS;
use crate::record::MediaRecord;
use crate::resolver::Quality;

/// Cache key: subject identifier plus quality tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject_id: String,
    pub quality: Quality,
}

impl CacheKey {
    pub fn new(subject_id: impl Into<String>, quality: Quality) -> Self {
        Self {
            subject_id: subject_id.into(),
            quality,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.subject_id, self.quality)
    }
}

struct CacheEntry {
    payload: Vec<MediaRecord>,
    inserted_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

impl CacheState {
    fn remove(&mut self, key: &CacheKey) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

/// Insertion-ordered cache with lazy expiry.
///
/// Capacity overflow evicts the oldest insertion regardless of access.
/// Expired entries are only purged when read.
pub struct ResultCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Vec<MediaRecord>> {
        let mut state = self.state.lock().await;

        let age = match state.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed(),
            None => {
                CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                return None;
            }
        };

        if age >= self.ttl {
            CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
            debug!(key = %key, age_secs = age.as_secs(), "Cache entry expired");
            state.remove(key);
            return None;
        }

        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        state.entries.get(key).map(|entry| entry.payload.clone())
    }

    /// Insert or replace. Re-inserting a key counts as a fresh insertion.
    pub async fn put(&self, key: CacheKey, payload: Vec<MediaRecord>) {
        let mut state = self.state.lock().await;

        if state.entries.contains_key(&key) {
            state.remove(&key);
        }

        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            debug!(key = %oldest, "Evicting oldest cache entry");
            state.entries.remove(&oldest);
        }

        state.order.push_back(key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.order.clear();
    }
}
