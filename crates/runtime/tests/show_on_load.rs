use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ads_runtime::providers::{InitializeCall, ShowCall};
use ads_runtime::{
    AdEvent, AdSession, AdsError, AdsSettings, Placement, Platform, ShowListeners, ShowOnLoad,
    ShowOptions, ShowOutcome, SimulatedAdProvider, WaitPhase,
};

fn ios_dev_settings() -> AdsSettings {
    AdsSettings {
        platform: Platform::Ios,
        ios_game_id: "18660".into(),
        enable_test_mode: true,
        development_build: true,
        ..AdsSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn shows_default_placement_once_it_fills() {
    let provider = SimulatedAdProvider::builder()
        .ready_after(Duration::from_millis(1200))
        .build();
    let session = AdSession::builder()
        .settings(ios_dev_settings())
        .provider(provider.clone())
        .build();
    let finished = Arc::new(AtomicU32::new(0));
    let on_finished = Arc::clone(&finished);

    let outcome = ShowOnLoad::new("")
        .show_timeout(Some(Duration::from_secs(15)))
        .run(
            &session,
            ShowListeners::new().on_finished(move || {
                on_finished.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .expect("ad should be shown");

    assert_eq!(outcome, ShowOutcome::Finished);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(
        provider.initialize_calls(),
        vec![InitializeCall {
            game_id: "18660".into(),
            test_mode: true,
        }]
    );
    assert_eq!(
        provider.show_calls(),
        vec![ShowCall {
            placement: Placement::default_placement(),
            options: ShowOptions {
                rewarded: false,
                gamer_sid: None,
            },
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn unsupported_platform_skips_everything() {
    let provider = SimulatedAdProvider::builder().unsupported().build();
    let session = AdSession::builder()
        .settings(ios_dev_settings())
        .provider(provider.clone())
        .build();

    let result = ShowOnLoad::new("video")
        .run(&session, ShowListeners::new())
        .await;

    assert!(matches!(result, Err(AdsError::NotSupported)));
    assert!(provider.initialize_calls().is_empty());
    assert!(provider.show_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn init_timeout_abandons_the_show() {
    let provider = SimulatedAdProvider::builder().never_initializes().build();
    let session = AdSession::builder()
        .settings(ios_dev_settings())
        .provider(provider.clone())
        .build();
    let mut events = session.subscribe();

    let result = ShowOnLoad::new("video")
        .init_timeout(Some(Duration::from_secs(2)))
        .run(&session, ShowListeners::new())
        .await;

    match result {
        Err(AdsError::InitTimeout { placement, waited }) => {
            assert_eq!(placement, Placement::new("video"));
            assert_eq!(waited, Duration::from_secs(2));
        }
        other => panic!("expected InitTimeout, got {:?}", other),
    }
    assert!(provider.show_calls().is_empty());

    let mut abandoned = None;
    while let Ok(event) = events.try_recv() {
        if let AdEvent::WaitAbandoned { phase, .. } = event {
            abandoned = Some(phase);
        }
    }
    assert_eq!(abandoned, Some(WaitPhase::Initialization));
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_waits_as_long_as_it_takes() {
    let provider = SimulatedAdProvider::builder()
        .initialized_after(Duration::from_secs(40))
        .ready_after(Duration::from_secs(60))
        .build();
    let session = AdSession::builder()
        .settings(ios_dev_settings())
        .provider(provider.clone())
        .build();

    let outcome = ShowOnLoad::new("")
        .init_timeout(Some(Duration::ZERO))
        .show_timeout(None)
        .run(&session, ShowListeners::new())
        .await
        .unwrap();

    assert_eq!(outcome, ShowOutcome::Finished);
    assert_eq!(provider.show_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_a_spawned_show_on_load() {
    let provider = SimulatedAdProvider::builder().never_ready("video").build();
    let session = AdSession::builder()
        .settings(ios_dev_settings())
        .provider(provider.clone())
        .build();

    ShowOnLoad::new("video")
        .show_timeout(None)
        .poll_interval(Duration::from_millis(100))
        .spawn(&session, ShowListeners::new());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(provider.ready_checks() > 0);

    session.teardown();
    tokio::task::yield_now().await;
    let checks = provider.ready_checks();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(provider.ready_checks(), checks);
    assert!(provider.show_calls().is_empty());
}
