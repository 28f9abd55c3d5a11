use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;

use ads_runtime::{
    AdSession, AdsError, AdsSettings, CooldownStore, InMemoryKeyValueStore, ManualClock,
    Placement, RewardGate, RewardGrantor, RewardedPlacement, ShowOutcome, SimulatedAdProvider,
    WaitPolicy,
};

const KEY: &str = "coins-button";

struct Fixture {
    provider: SimulatedAdProvider,
    clock: ManualClock,
    gate: RewardGate,
    grants: Arc<AtomicU32>,
}

struct CountingGrantor {
    grants: Arc<AtomicU32>,
    fail: bool,
}

#[async_trait]
impl RewardGrantor for CountingGrantor {
    async fn grant(&self, _reward: &RewardedPlacement) -> ads_runtime::Result<()> {
        if self.fail {
            return Err(AdsError::Reward("inventory offline".into()));
        }
        self.grants.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn fixture_with(provider: SimulatedAdProvider, failing_grantor: bool) -> Fixture {
    let session = AdSession::builder()
        .settings(AdsSettings {
            development_build: true,
            ..AdsSettings::default()
        })
        .provider(provider.clone())
        .build();
    session.initialize().unwrap();
    session
        .wait_until_initialized(&Placement::default(), WaitPolicy::with_timeout(Duration::from_secs(5)))
        .await
        .unwrap();

    let clock = ManualClock::starting_now();
    let cooldowns = Arc::new(CooldownStore::new(
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(clock.clone()),
    ));
    let grants = Arc::new(AtomicU32::new(0));
    let grantor = Arc::new(CountingGrantor {
        grants: Arc::clone(&grants),
        fail: failing_grantor,
    });

    Fixture {
        provider,
        clock,
        gate: RewardGate::with_grantor(session, cooldowns, grantor),
        grants,
    }
}

async fn fixture() -> Fixture {
    fixture_with(SimulatedAdProvider::new(), false).await
}

#[tokio::test(start_paused = true)]
async fn fresh_key_is_ready_when_provider_is() {
    let fx = fixture().await;

    assert!(fx.gate.cooldowns().elapsed(KEY));
    assert!(fx.gate.is_ready(&Placement::new("rewardedVideo"), KEY));
}

#[tokio::test(start_paused = true)]
async fn finished_show_starts_cooldown_until_time_passes() {
    let fx = fixture().await;

    fx.gate
        .on_show_completed(ShowOutcome::Finished, KEY, Duration::from_secs(300))
        .unwrap();
    assert!(!fx.gate.cooldowns().elapsed(KEY));

    fx.clock.advance(TimeDelta::seconds(299));
    assert!(!fx.gate.cooldowns().elapsed(KEY));

    fx.clock.advance(TimeDelta::seconds(1));
    assert!(fx.gate.cooldowns().elapsed(KEY));
}

#[tokio::test(start_paused = true)]
async fn skipped_failed_and_zero_cooldown_leave_the_gate_open() {
    let fx = fixture().await;

    fx.gate
        .on_show_completed(ShowOutcome::Skipped, KEY, Duration::from_secs(300))
        .unwrap();
    fx.gate
        .on_show_completed(ShowOutcome::Failed, KEY, Duration::from_secs(300))
        .unwrap();
    fx.gate
        .on_show_completed(ShowOutcome::Finished, KEY, Duration::ZERO)
        .unwrap();

    assert!(fx.gate.cooldowns().elapsed(KEY));
}

#[tokio::test(start_paused = true)]
async fn active_cooldown_short_circuits_provider_check() {
    let fx = fixture().await;
    fx.gate
        .on_show_completed(ShowOutcome::Finished, KEY, Duration::from_secs(60))
        .unwrap();

    let checks = fx.provider.ready_checks();
    assert!(!fx.gate.is_ready(&Placement::default(), KEY));
    assert_eq!(fx.provider.ready_checks(), checks);
}

#[tokio::test(start_paused = true)]
async fn cooldowns_are_independent_per_key() {
    let fx = fixture().await;
    fx.gate
        .on_show_completed(ShowOutcome::Finished, KEY, Duration::from_secs(60))
        .unwrap();

    assert!(!fx.gate.is_ready(&Placement::default(), KEY));
    assert!(fx.gate.is_ready(&Placement::default(), "other-button"));
}

#[tokio::test(start_paused = true)]
async fn reset_makes_key_available_immediately() {
    let fx = fixture().await;
    fx.gate
        .on_show_completed(ShowOutcome::Finished, KEY, Duration::from_secs(600))
        .unwrap();
    fx.gate
        .on_show_completed(ShowOutcome::Finished, "second", Duration::from_secs(600))
        .unwrap();

    fx.gate.reset_cooldown(KEY).unwrap();
    assert!(fx.gate.cooldowns().elapsed(KEY));
    assert!(!fx.gate.cooldowns().elapsed("second"));

    fx.gate.reset_all().unwrap();
    assert!(fx.gate.cooldowns().elapsed("second"));
}

#[tokio::test(start_paused = true)]
async fn rewarded_show_grants_once_and_starts_cooldown() {
    let fx = fixture().await;
    let reward = RewardedPlacement::new("rewardedVideo", KEY).cooldown(Duration::from_secs(300));

    let outcome = fx.gate.show_rewarded(&reward).await.unwrap();

    assert_eq!(outcome, ShowOutcome::Finished);
    assert_eq!(fx.grants.load(Ordering::SeqCst), 1);
    assert!(fx.provider.show_calls()[0].options.rewarded);
    assert!(!fx.gate.is_ready(&reward.placement, KEY));

    let again = fx.gate.show_rewarded(&reward).await;
    assert!(matches!(again, Err(AdsError::CooldownActive { .. })));
    assert_eq!(fx.provider.show_calls().len(), 1);

    fx.clock.advance(TimeDelta::seconds(300));
    assert!(fx.gate.is_ready(&reward.placement, KEY));
}

#[tokio::test(start_paused = true)]
async fn skipped_rewarded_show_grants_nothing() {
    let fx = fixture_with(
        SimulatedAdProvider::builder()
            .outcome(ShowOutcome::Skipped)
            .build(),
        false,
    )
    .await;
    let reward = RewardedPlacement::new("rewardedVideo", KEY);

    let outcome = fx.gate.show_rewarded(&reward).await.unwrap();

    assert_eq!(outcome, ShowOutcome::Skipped);
    assert_eq!(fx.grants.load(Ordering::SeqCst), 0);
    assert!(fx.gate.cooldowns().elapsed(KEY));
}

#[tokio::test(start_paused = true)]
async fn failed_grant_leaves_cooldown_untouched() {
    let fx = fixture_with(SimulatedAdProvider::new(), true).await;
    let reward = RewardedPlacement::new("rewardedVideo", KEY);

    let result = fx.gate.show_rewarded(&reward).await;

    assert!(matches!(result, Err(AdsError::Reward(_))));
    assert!(fx.gate.cooldowns().elapsed(KEY));
}

#[tokio::test(start_paused = true)]
async fn reset_all_covers_cooldowns_persisted_before_this_gate() {
    let fx = fixture().await;
    fx.gate
        .cooldowns()
        .set("from-last-run", fx.gate.cooldowns().now() + TimeDelta::hours(1))
        .unwrap();
    assert!(!fx.gate.cooldowns().elapsed("from-last-run"));

    fx.gate.reset_all().unwrap();

    assert!(fx.gate.cooldowns().elapsed("from-last-run"));
}
