//! Quality tiers and request flags decoded once at the boundary.

use serde::{Deserialize, Serialize};

/// User-facing resolution tier.
///
/// Unrecognized labels decode to [`Quality::P1080`], the second-highest tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Quality {
    P360,
    P480,
    P720,
    #[default]
    P1080,
    P1080Plus,
}

impl Quality {
    /// All tiers, lowest first.
    pub const ALL: [Quality; 5] = [
        Quality::P360,
        Quality::P480,
        Quality::P720,
        Quality::P1080,
        Quality::P1080Plus,
    ];

    /// Provider numeric quality code (`qn`).
    pub fn code(&self) -> u32 {
        match self {
            Quality::P360 => 16,
            Quality::P480 => 32,
            Quality::P720 => 64,
            Quality::P1080 => 80,
            Quality::P1080Plus => 112,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::P360 => "360P",
            Quality::P480 => "480P",
            Quality::P720 => "720P",
            Quality::P1080 => "1080P",
            Quality::P1080Plus => "1080P+",
        }
    }

    /// Decode a label, case-insensitively. Unknown labels yield the default tier.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Quality {
    fn from(label: String) -> Self {
        Quality::from_label(&label)
    }
}

impl From<Quality> for String {
    fn from(quality: Quality) -> Self {
        quality.label().to_string()
    }
}

/// Whether resolved URLs should be rewritten through a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    #[default]
    Direct,
    Relayed,
}

impl RelayMode {
    /// Decode a `true`/`false`/`1`/`0` flag. Anything else means direct.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => RelayMode::Relayed,
            _ => RelayMode::Direct,
        }
    }

    pub fn is_relayed(&self) -> bool {
        matches!(self, RelayMode::Relayed)
    }
}

impl From<bool> for RelayMode {
    fn from(relayed: bool) -> Self {
        if relayed {
            RelayMode::Relayed
        } else {
            RelayMode::Direct
        }
    }
}
