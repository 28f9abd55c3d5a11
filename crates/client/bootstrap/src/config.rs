//! Ad session configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ads_runtime::{AdsSettings, Platform, WaitPolicy};

/// Which provider adapter the host should wire in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderChoice {
    #[default]
    Simulated,
    Unsupported,
}

impl ProviderChoice {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Some(Self::Simulated),
            "unsupported" | "none" => Some(Self::Unsupported),
            _ => None,
        }
    }
}

/// Configuration required to bootstrap an ad session.
#[derive(Clone, Debug, Default)]
pub struct AdsConfig {
    pub settings: AdsSettings,
    pub provider: ProviderChoice,
    /// Wait policy for initialization in show-on-load flows.
    pub init_wait: WaitPolicy,
    /// Wait policy for a placement to fill in show-on-load flows.
    pub ready_wait: WaitPolicy,
    pub data_dir: Option<PathBuf>,
    pub gamer_sid: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl AdsConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ADS_PLATFORM` - `ios`, `android`, or anything else (default: android)
    /// - `ADS_IOS_GAME_ID` / `ADS_ANDROID_GAME_ID` - Game ids (default: 18660 / 18658)
    /// - `ADS_TEST_MODE` - Request test ads (default: true)
    /// - `ADS_LOG_INFO`, `ADS_LOG_DEBUG`, `ADS_LOG_WARNING`, `ADS_LOG_ERROR` - Provider log flags
    /// - `ADS_PROVIDER` - `simulated` or `unsupported` (default: simulated)
    /// - `ADS_POLL_INTERVAL_MS` - Sampling interval while waiting (default: 500)
    /// - `ADS_INIT_TIMEOUT_SECS` - Initialization wait, 0 disables (default: 15)
    /// - `ADS_SHOW_TIMEOUT_SECS` - Readiness wait, 0 disables (default: 15)
    /// - `ADS_DATA_DIR` - Directory for the cooldown store (default: platform-specific)
    /// - `ADS_GAMER_SID` - Identifier attached to rewarded shows (optional)
    /// - `ADS_LOG_DIR` - Directory for rolling log files (optional)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let settings = &mut config.settings;

        if let Ok(platform) = env::var("ADS_PLATFORM") {
            settings.platform = Platform::parse(&platform);
        }
        if let Ok(id) = env::var("ADS_IOS_GAME_ID") {
            settings.ios_game_id = id;
        }
        if let Ok(id) = env::var("ADS_ANDROID_GAME_ID") {
            settings.android_game_id = id;
        }
        if let Some(enable) = read_env::<bool>("ADS_TEST_MODE") {
            settings.enable_test_mode = enable;
        }

        if let Some(flag) = read_env::<bool>("ADS_LOG_INFO") {
            settings.log.info = flag;
        }
        if let Some(flag) = read_env::<bool>("ADS_LOG_DEBUG") {
            settings.log.debug = flag;
        }
        if let Some(flag) = read_env::<bool>("ADS_LOG_WARNING") {
            settings.log.warning = flag;
        }
        if let Some(flag) = read_env::<bool>("ADS_LOG_ERROR") {
            settings.log.error = flag;
        }

        if let Some(choice) = env::var("ADS_PROVIDER")
            .ok()
            .and_then(|v| ProviderChoice::parse(&v))
        {
            config.provider = choice;
        }

        if let Some(ms) = read_env::<u64>("ADS_POLL_INTERVAL_MS") {
            let interval = Duration::from_millis(ms.max(1));
            config.init_wait.interval = interval;
            config.ready_wait.interval = interval;
        }
        if let Some(secs) = read_env::<u64>("ADS_INIT_TIMEOUT_SECS") {
            config.init_wait.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = read_env::<u64>("ADS_SHOW_TIMEOUT_SECS") {
            config.ready_wait.timeout = Some(Duration::from_secs(secs));
        }

        config.data_dir = env::var("ADS_DATA_DIR").ok().map(PathBuf::from);
        config.gamer_sid = env::var("ADS_GAMER_SID").ok();
        config.log_dir = env::var("ADS_LOG_DIR").ok().map(PathBuf::from);

        config
    }

    /// Directory for durable data: `ADS_DATA_DIR`, else the platform data dir.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "ads-helper", "ads-helper")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_choice_parse() {
        assert_eq!(ProviderChoice::parse("Simulated"), Some(ProviderChoice::Simulated));
        assert_eq!(ProviderChoice::parse(" none "), Some(ProviderChoice::Unsupported));
        assert_eq!(ProviderChoice::parse("admob"), None);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = AdsConfig {
            data_dir: Some(PathBuf::from("/tmp/ads")),
            ..AdsConfig::default()
        };
        assert_eq!(config.resolve_data_dir(), Some(PathBuf::from("/tmp/ads")));
    }
}
