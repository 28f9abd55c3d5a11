//! Value types shared by the session, reward gate, and provider adapters.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A named ad slot. The empty id denotes the provider's default placement.
///
/// Ids are trimmed on construction so `" rewardedVideo "` and
/// `"rewardedVideo"` address the same slot, and a blank id collapses to the
/// default placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement(Option<String>);

impl Placement {
    pub fn new(id: impl AsRef<str>) -> Self {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_owned()))
        }
    }

    /// The provider's default placement.
    pub const fn default_placement() -> Self {
        Self(None)
    }

    /// Placement id, or `None` for the default placement.
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_default(&self) -> bool {
        self.0.is_none()
    }
}

impl From<&str> for Placement {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Placement {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "default"),
        }
    }
}

/// Initialization lifecycle of an [`AdSession`](crate::AdSession).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitializationState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Unsupported,
    Failed,
}

impl fmt::Display for InitializationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InitializationState::Uninitialized => "uninitialized",
            InitializationState::Initializing => "initializing",
            InitializationState::Ready => "ready",
            InitializationState::Unsupported => "unsupported",
            InitializationState::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Terminal result of a show request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShowOutcome {
    /// The ad played to the end. Reward-eligible.
    Finished,
    /// The viewer skipped the ad.
    Skipped,
    /// The ad could not be shown.
    Failed,
}

impl ShowOutcome {
    pub fn is_reward_eligible(self) -> bool {
        matches!(self, ShowOutcome::Finished)
    }
}

impl fmt::Display for ShowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShowOutcome::Finished => "finished",
            ShowOutcome::Skipped => "skipped",
            ShowOutcome::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Build target the session is running on. Selects the configured game id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Ios,
    #[default]
    Android,
    Other,
}

impl Platform {
    /// Parse a platform name; anything unrecognised maps to [`Platform::Other`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "ios" | "iphone" => Platform::Ios,
            "android" => Platform::Android,
            _ => Platform::Other,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Other => "other",
        };
        write!(f, "{}", label)
    }
}

bitflags! {
    /// Verbosity forwarded to the provider's own logger.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DebugLevel: u8 {
        const INFO = 1 << 0;
        const DEBUG = 1 << 1;
        const WARNING = 1 << 2;
        const ERROR = 1 << 3;
    }
}

impl Default for DebugLevel {
    fn default() -> Self {
        DebugLevel::WARNING | DebugLevel::ERROR
    }
}

/// Options passed to the provider for a single show request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowOptions {
    pub rewarded: bool,
    /// Server-to-server redeem identifier. Only set for rewarded shows.
    pub gamer_sid: Option<String>,
}

/// Trim a free-form identifier, mapping blank input to `None`.
pub(crate) fn normalize_id(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_placement_is_default() {
        assert!(Placement::new("").is_default());
        assert!(Placement::new("   ").is_default());
        assert_eq!(Placement::new(" video ").id(), Some("video"));
        assert_eq!(Placement::default_placement().to_string(), "default");
    }

    #[test]
    fn only_finished_is_reward_eligible() {
        assert!(ShowOutcome::Finished.is_reward_eligible());
        assert!(!ShowOutcome::Skipped.is_reward_eligible());
        assert!(!ShowOutcome::Failed.is_reward_eligible());
    }

    #[test]
    fn platform_parse_is_lenient() {
        assert_eq!(Platform::parse("iOS"), Platform::Ios);
        assert_eq!(Platform::parse(" android "), Platform::Android);
        assert_eq!(Platform::parse("webgl"), Platform::Other);
    }

    #[test]
    fn normalize_id_trims_and_drops_blank() {
        assert_eq!(normalize_id(Some("  gamer-1 ")), Some("gamer-1".to_owned()));
        assert_eq!(normalize_id(Some("   ")), None);
        assert_eq!(normalize_id(None), None);
    }
}
