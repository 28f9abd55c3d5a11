//! Static ad settings: game ids per platform, test mode, and log flags.
use serde::{Deserialize, Serialize};

use crate::types::{DebugLevel, Platform};

/// Game id shipped as the iOS default.
pub const DEFAULT_IOS_GAME_ID: &str = "18660";
/// Game id shipped as the Android default.
pub const DEFAULT_ANDROID_GAME_ID: &str = "18658";

/// Configuration read once per session and treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdsSettings {
    pub platform: Platform,
    pub ios_game_id: String,
    pub android_game_id: String,
    /// Request test ads. Only honored when `development_build` is set.
    pub enable_test_mode: bool,
    /// Whether this is a development build. Defaults to `cfg!(debug_assertions)`.
    pub development_build: bool,
    pub log: LogFlags,
}

impl AdsSettings {
    /// Game id for the configured platform, trimmed. `None` when the platform
    /// has no id or the id is blank.
    pub fn game_id(&self) -> Option<&str> {
        let id = match self.platform {
            Platform::Ios => self.ios_game_id.as_str(),
            Platform::Android => self.android_game_id.as_str(),
            Platform::Other => return None,
        };
        Some(id.trim()).filter(|id| !id.is_empty())
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.log.debug_level()
    }
}

impl Default for AdsSettings {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            ios_game_id: DEFAULT_IOS_GAME_ID.to_owned(),
            android_game_id: DEFAULT_ANDROID_GAME_ID.to_owned(),
            enable_test_mode: true,
            development_build: cfg!(debug_assertions),
            log: LogFlags::default(),
        }
    }
}

/// Which provider log channels to enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFlags {
    pub info: bool,
    pub debug: bool,
    pub warning: bool,
    pub error: bool,
}

impl LogFlags {
    pub fn debug_level(&self) -> DebugLevel {
        let mut level = DebugLevel::empty();
        level.set(DebugLevel::INFO, self.info);
        level.set(DebugLevel::DEBUG, self.debug);
        level.set(DebugLevel::WARNING, self.warning);
        level.set(DebugLevel::ERROR, self.error);
        level
    }
}

impl Default for LogFlags {
    fn default() -> Self {
        Self {
            info: false,
            debug: false,
            warning: true,
            error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_id_follows_platform() {
        let mut settings = AdsSettings::default();
        assert_eq!(settings.game_id(), Some(DEFAULT_ANDROID_GAME_ID));

        settings.platform = Platform::Ios;
        assert_eq!(settings.game_id(), Some(DEFAULT_IOS_GAME_ID));

        settings.platform = Platform::Other;
        assert_eq!(settings.game_id(), None);
    }

    #[test]
    fn blank_game_id_is_missing() {
        let settings = AdsSettings {
            android_game_id: "   ".into(),
            ..AdsSettings::default()
        };
        assert_eq!(settings.game_id(), None);
    }

    #[test]
    fn default_log_flags_map_to_warning_and_error() {
        assert_eq!(LogFlags::default().debug_level(), DebugLevel::default());
        let all = LogFlags {
            info: true,
            debug: true,
            warning: true,
            error: true,
        };
        assert_eq!(all.debug_level(), DebugLevel::all());
    }
}
