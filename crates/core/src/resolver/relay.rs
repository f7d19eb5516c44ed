//! Relay endpoint probing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::http::{HttpClient, HttpRequest};
use crate::metrics::RELAY_PROBES;

/// A media URL rewritten through a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedUrl {
    pub relay_base: String,
    pub url: String,
}

/// Finds the first relay, in configured order, that can serve a URL.
pub struct RelayProber {
    http: Arc<dyn HttpClient>,
    relays: Vec<String>,
    timeout: Duration,
}

impl RelayProber {
    pub fn new(http: Arc<dyn HttpClient>, config: &ResolverConfig) -> Self {
        Self {
            http,
            relays: config.relays.clone(),
            timeout: config.relay_timeout(),
        }
    }

    pub fn has_relays(&self) -> bool {
        !self.relays.is_empty()
    }

    /// Probe each relay with a HEAD check. Returns `None` when none respond.
    pub async fn probe(&self, url: &str, headers: &BTreeMap<String, String>) -> Option<RelayedUrl> {
        let encoded = urlencoding::encode(url);

        for relay_base in &self.relays {
            let relayed = format!("{}{}", relay_base, encoded);
            let request = HttpRequest::new(relayed.clone())
                .headers(headers.iter())
                .timeout(self.timeout);

            match self.http.head(request).await {
                Ok(status) if (200..400).contains(&status) => {
                    RELAY_PROBES.with_label_values(&["reachable"]).inc();
                    debug!(relay = %relay_base, status, "Relay reachable");
                    return Some(RelayedUrl {
                        relay_base: relay_base.clone(),
                        url: relayed,
                    });
                }
                Ok(status) => {
                    RELAY_PROBES.with_label_values(&["unreachable"]).inc();
                    debug!(relay = %relay_base, status, "Relay rejected probe");
                }
                Err(e) => {
                    RELAY_PROBES.with_label_values(&["error"]).inc();
                    debug!(relay = %relay_base, error = %e, "Relay probe failed");
                }
            }
        }

        if self.has_relays() {
            warn!(relays = self.relays.len(), "No relay reachable, keeping direct URL");
        }
        None
    }
}
