//! Reward gate: cooldown-limited rewarded placements.
//!
//! A rewarded placement may be shown only when its cooldown has elapsed and
//! the provider has an ad. A finished show grants the reward and pushes the
//! cooldown forward; skipped or failed shows leave it alone.
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::api::{AdsError, Result};
use crate::events::AdEvent;
use crate::listeners::ShowListeners;
use crate::repository::{CooldownStore, latest_storable};
use crate::session::AdSession;
use crate::types::{Placement, ShowOutcome};

/// A rewarded placement with its cooldown and reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardedPlacement {
    pub placement: Placement,
    /// Identifies the cooldown slot, e.g. one per reward button.
    pub cooldown_key: String,
    pub cooldown: Duration,
    pub reward_amount: u32,
}

impl RewardedPlacement {
    pub fn new(placement: impl Into<Placement>, cooldown_key: impl Into<String>) -> Self {
        Self {
            placement: placement.into(),
            cooldown_key: cooldown_key.into(),
            cooldown: Duration::from_secs(300),
            reward_amount: 250,
        }
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn reward_amount(mut self, amount: u32) -> Self {
        self.reward_amount = amount;
        self
    }
}

/// Hands the reward to the player once a rewarded ad finishes.
///
/// Implementations might credit a local inventory or call a game server.
#[async_trait]
pub trait RewardGrantor: Send + Sync {
    async fn grant(&self, reward: &RewardedPlacement) -> Result<()>;
}

/// Grantor that only logs the grant.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRewardGrantor;

#[async_trait]
impl RewardGrantor for LogRewardGrantor {
    async fn grant(&self, reward: &RewardedPlacement) -> Result<()> {
        tracing::info!(
            "Granting the user a reward of {} for {}",
            reward.reward_amount,
            reward.placement
        );
        Ok(())
    }
}

pub struct RewardGate {
    session: AdSession,
    cooldowns: Arc<CooldownStore>,
    grantor: Arc<dyn RewardGrantor>,
    known_keys: Mutex<BTreeSet<String>>,
}

impl RewardGate {
    pub fn new(session: AdSession, cooldowns: Arc<CooldownStore>) -> Self {
        Self::with_grantor(session, cooldowns, Arc::new(LogRewardGrantor))
    }

    pub fn with_grantor(
        session: AdSession,
        cooldowns: Arc<CooldownStore>,
        grantor: Arc<dyn RewardGrantor>,
    ) -> Self {
        Self {
            session,
            cooldowns,
            grantor,
            known_keys: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn session(&self) -> &AdSession {
        &self.session
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.cooldowns
    }

    /// Cooldown elapsed and the provider has an ad. The provider is not
    /// consulted while the cooldown is active.
    pub fn is_ready(&self, placement: &Placement, cooldown_key: &str) -> bool {
        self.remember(cooldown_key);
        self.cooldowns.elapsed(cooldown_key) && self.session.is_ready(placement)
    }

    /// When `cooldown_key` becomes available again.
    pub fn available_at(&self, cooldown_key: &str) -> DateTime<Utc> {
        self.cooldowns.get(cooldown_key)
    }

    /// Start the cooldown after a reward-eligible outcome.
    ///
    /// Only `Finished` with a non-zero cooldown writes anything.
    pub fn on_show_completed(
        &self,
        outcome: ShowOutcome,
        cooldown_key: &str,
        cooldown: Duration,
    ) -> Result<()> {
        if !outcome.is_reward_eligible() || cooldown.is_zero() {
            return Ok(());
        }

        let until = cooldown_deadline(self.cooldowns.now(), cooldown);
        self.cooldowns.set(cooldown_key, until)?;
        self.remember(cooldown_key);

        tracing::info!(
            "User was rewarded. Next rewarded ad is available in {} seconds.",
            cooldown.as_secs()
        );
        self.session.events().publish(AdEvent::CooldownUpdated {
            key: cooldown_key.to_owned(),
            until,
        });
        Ok(())
    }

    /// Make `cooldown_key` available immediately.
    pub fn reset_cooldown(&self, cooldown_key: &str) -> Result<()> {
        self.remember(cooldown_key);
        self.cooldowns.reset(cooldown_key)?;
        Ok(())
    }

    /// Reset every cooldown this gate has seen or that is persisted.
    pub fn reset_all(&self) -> Result<()> {
        let mut keys = self
            .known_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        keys.extend(self.cooldowns.keys()?);

        tracing::info!("Resetting {} reward cooldown(s)...", keys.len());
        for key in keys {
            self.cooldowns.reset(&key)?;
        }
        Ok(())
    }

    /// Show a rewarded ad and settle the reward and cooldown.
    ///
    /// The reward is granted before the cooldown moves, so a failed grant
    /// leaves the placement available.
    pub async fn show_rewarded(&self, reward: &RewardedPlacement) -> Result<ShowOutcome> {
        let key = reward.cooldown_key.as_str();
        self.remember(key);

        if !self.cooldowns.elapsed(key) {
            let until = self.cooldowns.get(key);
            tracing::warn!("Reward for {} is cooling down until {}", reward.placement, until);
            return Err(AdsError::CooldownActive {
                key: key.to_owned(),
                until,
            });
        }

        let ticket = self
            .session
            .show(reward.placement.clone(), true, ShowListeners::new())?;
        let outcome = ticket.await?;

        if outcome.is_reward_eligible() {
            self.grantor.grant(reward).await.inspect_err(|e| {
                tracing::error!("Failed to grant reward for {}: {}", reward.placement, e);
            })?;
        }

        self.on_show_completed(outcome, key, reward.cooldown)?;
        Ok(outcome)
    }

    fn remember(&self, cooldown_key: &str) {
        let mut keys = self
            .known_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !keys.contains(cooldown_key) {
            keys.insert(cooldown_key.to_owned());
        }
    }
}

fn cooldown_deadline(now: DateTime<Utc>, cooldown: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(cooldown)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .map_or(latest_storable(), |until| until.min(latest_storable()))
}
