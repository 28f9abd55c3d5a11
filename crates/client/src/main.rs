//! Ad session demo binary.
//!
//! Composition root that loads [`AdsConfig`] from the environment, wires a
//! provider, shows an interstitial on load, then offers one rewarded show
//! through the cooldown gate.
//!
//! ```bash
//! ADS_PLATFORM=ios ADS_SHOW_TIMEOUT_SECS=5 cargo run -p ads-client
//! ```
mod logging;

use std::time::Duration;

use anyhow::Result;
use ads_bootstrap::{AdsBuilder, AdsConfig};
use ads_runtime::{AdEvent, AdsError, RewardedPlacement, ShowListeners, ShowOnLoad};
use tokio::sync::broadcast::error::RecvError;

const REWARDED_PLACEMENT: &str = "rewardedVideo";
const REWARD_COOLDOWN_KEY: &str = "demo-reward-button";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = AdsConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting ad session demo");
    tracing::info!("Platform: {}", config.settings.platform);
    tracing::info!("Provider: {:?}", config.provider);

    let setup = AdsBuilder::new(config).build()?;
    let session = setup.session.clone();

    let mut events = session.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event log lagged, skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if session.settings().development_build {
        setup.gate.reset_all()?;
    }

    let on_load = ShowOnLoad::new("")
        .init_timeout(setup.config.init_wait.timeout)
        .show_timeout(setup.config.ready_wait.timeout)
        .poll_interval(setup.config.ready_wait.interval);
    let listeners = ShowListeners::new()
        .on_finished(|| tracing::info!("Interstitial watched"))
        .on_skipped(|| tracing::info!("Interstitial skipped"))
        .on_failed(|| tracing::info!("Interstitial failed"));

    match on_load.run(&session, listeners).await {
        Ok(outcome) => tracing::info!("Show on load finished: {:?}", outcome),
        Err(AdsError::NotSupported) => {
            tracing::warn!("Ads are not supported on this platform");
            session.teardown();
            event_log.abort();
            return Ok(());
        }
        Err(e) => tracing::warn!("Show on load abandoned: {}", e),
    }

    let reward = RewardedPlacement::new(REWARDED_PLACEMENT, REWARD_COOLDOWN_KEY)
        .cooldown(Duration::from_secs(300));
    match session
        .wait_until_ready(&reward.placement, setup.config.ready_wait)
        .await
    {
        Ok(_) => match setup.gate.show_rewarded(&reward).await {
            Ok(outcome) => tracing::info!("Rewarded show finished: {:?}", outcome),
            Err(e) => tracing::warn!("Rewarded show not completed: {}", e),
        },
        Err(e) => tracing::warn!("Rewarded placement unavailable: {}", e),
    }
    tracing::info!(
        "Reward button available again at {}",
        setup.gate.available_at(REWARD_COOLDOWN_KEY)
    );

    session.teardown();
    event_log.abort();
    tracing::info!("Ad session demo finished");
    Ok(())
}

fn log_event(event: &AdEvent) {
    match event {
        AdEvent::StateChanged { from, to } => tracing::debug!("State: {} -> {}", from, to),
        AdEvent::ShowStarted {
            placement,
            rewarded,
        } => tracing::debug!("Show started: {} (rewarded: {})", placement, rewarded),
        AdEvent::ShowCompleted { placement, outcome } => {
            tracing::debug!("Show completed: {} -> {:?}", placement, outcome)
        }
        AdEvent::WaitAbandoned { placement, phase } => {
            tracing::debug!("Wait abandoned: {} during {}", placement, phase)
        }
        AdEvent::CooldownUpdated { key, until } => {
            tracing::debug!("Cooldown {} until {}", key, until)
        }
    }
}
