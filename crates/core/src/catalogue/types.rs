//! Types for catalogue enumeration.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::http::HttpError;

/// Duration as reported upstream.
///
/// The web catalogue reports `"MM:SS"` text, the app API and video metadata
/// report whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Seconds(u64),
    Text(String),
}

impl Default for RawDuration {
    fn default() -> Self {
        RawDuration::Seconds(0)
    }
}

/// One raw entry from an uploader's catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    /// Provider-assigned video identifier (`BV…`).
    pub id: String,
    /// Numeric archive id, when the source reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid: Option<u64>,
    pub title: String,
    /// Cover image reference, possibly protocol-relative.
    #[serde(default)]
    pub cover: String,
    /// Creation time, unix seconds.
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub duration: RawDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Classification of a non-zero provider response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamCode {
    /// Request intercepted by risk control pending verification (-352).
    VerificationRequired,
    /// Request rejected as too frequent (-412, -799).
    RateLimited,
    /// Any other provider error code.
    Other(i64),
}

impl UpstreamCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            -352 => UpstreamCode::VerificationRequired,
            -412 | -799 => UpstreamCode::RateLimited,
            other => UpstreamCode::Other(other),
        }
    }

    /// Codes that trigger throttling and fallback handling instead of a plain stop.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UpstreamCode::VerificationRequired | UpstreamCode::RateLimited
        )
    }
}

/// Errors that can occur while fetching catalogue pages.
#[derive(Debug, Clone, Error)]
pub enum CatalogueError {
    #[error("Transport failure: {0}")]
    Transport(#[from] HttpError),

    #[error("Upstream rejected request: code {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Failed to parse catalogue response: {0}")]
    Parse(String),
}

impl CatalogueError {
    /// Classified upstream code, if this is an upstream rejection.
    pub fn upstream_code(&self) -> Option<UpstreamCode> {
        match self {
            CatalogueError::Upstream { code, .. } => Some(UpstreamCode::from_code(*code)),
            _ => None,
        }
    }
}

/// Accepts integers, numeric strings, and placeholders such as `"--"` (as 0).
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
