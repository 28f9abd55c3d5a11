//! Ad session controller.
//!
//! [`AdSession`] owns the initialization state machine, the listener slot for
//! the show in flight, and every background wait started on the session's
//! behalf. It is a cheap cloneable handle; all clones drive the same session.
//!
//! ```text
//! Uninitialized ──initialize──▶ Initializing ──provider done──▶ Ready
//!       │                            │
//!       ├── unsupported ──▶ Unsupported (retryable)
//!       └── no game id  ──▶ Failed      (retryable)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::{AbortHandle, JoinSet};

use crate::api::{AdProvider, AdsError, OutcomeSink, Result, WaitPhase};
use crate::events::{AdEvent, EventBus};
use crate::listeners::{ShowListeners, ShowTicket};
use crate::settings::AdsSettings;
use crate::types::{InitializationState, Placement, ShowOptions, ShowOutcome, normalize_id};
use crate::wait::{WaitPolicy, poll_until};

/// Session configuration shared by the controller and its background waits.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub settings: AdsSettings,
    /// Policy for watching the provider finish initializing after
    /// `initialize`. Indefinite by default.
    pub init_watch: WaitPolicy,
    pub event_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settings: AdsSettings::default(),
            init_watch: WaitPolicy::indefinite(),
            event_buffer_size: 64,
        }
    }
}

struct ActiveShow {
    id: u64,
    placement: Placement,
    listeners: ShowListeners,
}

struct Inner {
    provider: Arc<dyn AdProvider>,
    config: SessionConfig,
    state: Mutex<InitializationState>,
    active_show: Mutex<Option<ActiveShow>>,
    next_show_id: AtomicU64,
    gamer_sid: Mutex<Option<String>>,
    events: EventBus,
    tasks: Mutex<JoinSet<()>>,
}

/// Handle to an ad session.
#[derive(Clone)]
pub struct AdSession {
    inner: Arc<Inner>,
}

impl AdSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Create a session with default configuration.
    pub fn new(provider: Arc<dyn AdProvider>) -> Self {
        Self::with_config(provider, SessionConfig::default())
    }

    pub fn with_config(provider: Arc<dyn AdProvider>, config: SessionConfig) -> Self {
        let events = EventBus::with_capacity(config.event_buffer_size);
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                state: Mutex::new(InitializationState::Uninitialized),
                active_show: Mutex::new(None),
                next_show_id: AtomicU64::new(1),
                gamer_sid: Mutex::new(None),
                events,
                tasks: Mutex::new(JoinSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn settings(&self) -> &AdsSettings {
        &self.inner.config.settings
    }

    pub fn provider(&self) -> &Arc<dyn AdProvider> {
        &self.inner.provider
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdEvent> {
        self.inner.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// Initialize with the game id and test mode from the session settings.
    pub fn initialize(&self) -> Result<()> {
        let settings = &self.inner.config.settings;
        let game_id = settings.game_id().unwrap_or_default().to_owned();
        self.initialize_with(&game_id, settings.enable_test_mode)
    }

    /// Initialize with an explicit game id and test mode.
    ///
    /// Returns immediately; the provider finishes in the background and the
    /// session becomes [`InitializationState::Ready`] once it reports done.
    /// Must be called from within a tokio runtime, which hosts that watch;
    /// otherwise [`AdsError::NoAsyncRuntime`] is returned and the state is left
    /// as it was.
    pub fn initialize_with(&self, game_id: &str, test_mode: bool) -> Result<()> {
        let settings = &self.inner.config.settings;
        let provider = &self.inner.provider;

        provider.set_debug_level(settings.debug_level());
        tracing::debug!("Ad provider debug level set to {:?}", settings.debug_level());

        let game_id = game_id.trim();
        {
            let mut state = self.lock_state();
            self.reconcile(&mut state);

            match *state {
                InitializationState::Initializing => {
                    tracing::warn!("Ads are already being initialized.");
                    return Err(AdsError::AlreadyInitializing);
                }
                InitializationState::Ready => {
                    tracing::info!("Ads are initialized.");
                    return Err(AdsError::AlreadyInitialized);
                }
                _ => {}
            }

            if !provider.is_supported() {
                tracing::warn!("Ads are not supported on the current runtime platform.");
                self.transition(&mut state, InitializationState::Unsupported);
                return Err(AdsError::NotSupported);
            }

            if game_id.is_empty() {
                tracing::error!("Failed to initialize ads. A valid game ID is required.");
                self.transition(&mut state, InitializationState::Failed);
                return Err(AdsError::NotConfigured);
            }

            ensure_runtime()?;

            self.transition(&mut state, InitializationState::Initializing);
        }

        if test_mode && !settings.development_build {
            tracing::warn!("Test mode requires a development build; initializing with test mode disabled.");
        }
        let test_mode = test_mode && settings.development_build;

        tracing::info!(
            "Initializing ads for game ID {} with test mode {}...",
            game_id,
            if test_mode { "enabled" } else { "disabled" }
        );
        provider.initialize(game_id, test_mode);

        self.watch_initialization();
        Ok(())
    }

    fn watch_initialization(&self) {
        let provider = Arc::clone(&self.inner.provider);
        let session = Arc::downgrade(&self.inner);
        let policy = self.inner.config.init_watch;

        self.spawn(async move {
            match poll_until(policy, || provider.is_initialized()).await {
                Ok(waited) => {
                    tracing::info!("Ads were initialized in {:.1} seconds.", waited.as_secs_f32());
                    if let Some(session) = upgrade(&session) {
                        let mut state = session.lock_state();
                        if *state == InitializationState::Initializing {
                            session.transition(&mut state, InitializationState::Ready);
                        }
                    }
                }
                Err(timeout) => {
                    tracing::warn!(
                        "Ads did not finish initializing within {:.1} seconds; no longer watching.",
                        timeout.waited.as_secs_f32()
                    );
                }
            }
        });
    }

    /// Current state, promoted to `Ready` if the provider has finished
    /// initializing since it was last observed.
    pub fn state(&self) -> InitializationState {
        let mut state = self.lock_state();
        self.reconcile(&mut state);
        *state
    }

    fn reconcile(&self, state: &mut InitializationState) {
        if matches!(
            *state,
            InitializationState::Uninitialized | InitializationState::Initializing
        ) && self.inner.provider.is_initialized()
        {
            self.transition(state, InitializationState::Ready);
        }
    }

    fn transition(&self, state: &mut InitializationState, to: InitializationState) {
        let from = *state;
        if from == to {
            return;
        }
        *state = to;
        tracing::debug!("Ad session {} -> {}", from, to);
        self.inner.events.publish(AdEvent::StateChanged { from, to });
    }

    fn lock_state(&self) -> MutexGuard<'_, InitializationState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Provider passthroughs
    // ------------------------------------------------------------------

    pub fn is_supported(&self) -> bool {
        self.inner.provider.is_supported()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.provider.is_initialized()
    }

    pub fn is_showing(&self) -> bool {
        self.inner.provider.is_showing()
    }

    /// Whether the provider can show an ad for `placement` right now.
    pub fn is_ready(&self, placement: &Placement) -> bool {
        self.inner.provider.is_ready(placement)
    }

    /// Identifier attached to rewarded shows for server-side redemption.
    /// Blank values clear it.
    pub fn set_gamer_sid(&self, sid: Option<&str>) {
        *self
            .inner
            .gamer_sid
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = normalize_id(sid);
    }

    pub fn gamer_sid(&self) -> Option<String> {
        self.inner
            .gamer_sid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ------------------------------------------------------------------
    // Showing
    // ------------------------------------------------------------------

    /// Show an ad for `placement`.
    ///
    /// Rejected without contacting the provider's `show` when the session is
    /// not ready or the placement has no ad. On acceptance `listeners`
    /// replaces any set still waiting and the returned ticket resolves to the
    /// outcome. A replaced set never fires; each outcome only reaches the
    /// listeners of the show it belongs to.
    ///
    /// Like [`AdSession::initialize_with`], requires a tokio runtime.
    pub fn show(
        &self,
        placement: impl Into<Placement>,
        rewarded: bool,
        listeners: ShowListeners,
    ) -> Result<ShowTicket> {
        let placement = placement.into();

        if self.state() != InitializationState::Ready {
            tracing::warn!("Unable to show ad for {}. Ads are not initialized.", placement);
            return Err(AdsError::NotInitialized);
        }

        if !self.inner.provider.is_ready(&placement) {
            tracing::warn!(
                "Unable to show ad. The ad placement {} is not ready.",
                placement
            );
            return Err(AdsError::NotReady { placement });
        }

        ensure_runtime()?;

        let options = ShowOptions {
            rewarded,
            gamer_sid: if rewarded { self.gamer_sid() } else { None },
        };

        let id = self.inner.next_show_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut active = self
                .inner
                .active_show
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = active.as_ref() {
                tracing::debug!(
                    "Replacing listeners still waiting on {}",
                    previous.placement
                );
            }
            *active = Some(ActiveShow {
                id,
                placement: placement.clone(),
                listeners,
            });
        }

        let (sink, outcome_rx) = OutcomeSink::channel();
        let (ticket_tx, ticket_rx) = tokio::sync::oneshot::channel();

        tracing::info!("Showing ad for {} now...", placement);
        self.inner.events.publish(AdEvent::ShowStarted {
            placement: placement.clone(),
            rewarded,
        });
        self.inner.provider.show(&placement, options, sink);

        let session = Arc::downgrade(&self.inner);
        let relay_placement = placement.clone();
        self.spawn(async move {
            let outcome = outcome_rx.await.unwrap_or_else(|_| {
                tracing::warn!("{}", AdsError::OutcomeDropped);
                ShowOutcome::Failed
            });
            if let Some(session) = upgrade(&session) {
                session.complete_show(id, relay_placement, outcome);
            }
            let _ = ticket_tx.send(outcome);
        });

        Ok(ShowTicket::new(placement, ticket_rx))
    }

    /// Dispatch an outcome to the waiting listener set.
    ///
    /// The set is removed before its callback runs, so every slot is cleared
    /// even if the callback panics. An outcome with no waiting set is logged
    /// and otherwise ignored.
    pub fn handle_outcome(&self, outcome: ShowOutcome) {
        let active = self
            .inner
            .active_show
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        log_outcome(outcome);
        if let Some(active) = active {
            let placement = active.placement.clone();
            self.dispatch(placement, Some(active.listeners), outcome);
        }
    }

    /// Settle show `id`: its listeners fire only if a later show has not
    /// replaced them.
    fn complete_show(&self, id: u64, placement: Placement, outcome: ShowOutcome) {
        let listeners = {
            let mut active = self
                .inner
                .active_show
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if active.as_ref().is_some_and(|current| current.id == id) {
                active.take().map(|show| show.listeners)
            } else {
                None
            }
        };

        log_outcome(outcome);
        if listeners.is_none() {
            tracing::debug!(
                "Listeners for {} were replaced by a later show; outcome {:?} not dispatched",
                placement,
                outcome
            );
        }
        self.dispatch(placement, listeners, outcome);
    }

    fn dispatch(&self, placement: Placement, listeners: Option<ShowListeners>, outcome: ShowOutcome) {
        self.inner.events.publish(AdEvent::ShowCompleted {
            placement: placement.clone(),
            outcome,
        });

        if let Some(listener) = listeners.and_then(|set| set.into_listener(outcome))
            && catch_unwind(AssertUnwindSafe(listener)).is_err()
        {
            tracing::error!("Show listener for {} panicked", placement);
        }
    }

    // ------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------

    /// Wait for the session to become ready under `policy`.
    ///
    /// `placement` only names the ad the caller intends to show in the
    /// timeout warning.
    pub async fn wait_until_initialized(
        &self,
        placement: &Placement,
        policy: WaitPolicy,
    ) -> Result<Duration> {
        match poll_until(policy, || self.state() == InitializationState::Ready).await {
            Ok(waited) => Ok(waited),
            Err(timeout) => {
                tracing::warn!(
                    "Ads failed to initialize in a timely manner. An ad for {} will not be shown.",
                    placement
                );
                self.inner.events.publish(AdEvent::WaitAbandoned {
                    placement: placement.clone(),
                    phase: WaitPhase::Initialization,
                });
                Err(AdsError::InitTimeout {
                    placement: placement.clone(),
                    waited: timeout.waited,
                })
            }
        }
    }

    /// Wait for `placement` to have an ad available under `policy`.
    pub async fn wait_until_ready(
        &self,
        placement: &Placement,
        policy: WaitPolicy,
    ) -> Result<Duration> {
        let provider = &self.inner.provider;
        match poll_until(policy, || provider.is_ready(placement)).await {
            Ok(waited) => Ok(waited),
            Err(timeout) => {
                tracing::warn!(
                    "Ads failed to be ready in a timely manner. An ad for {} will not be shown.",
                    placement
                );
                self.inner.events.publish(AdEvent::WaitAbandoned {
                    placement: placement.clone(),
                    phase: WaitPhase::Readiness,
                });
                Err(AdsError::ShowTimeout {
                    placement: placement.clone(),
                    waited: timeout.waited,
                })
            }
        }
    }

    /// Wait for `placement` to be ready, then show it.
    pub async fn show_when_ready(
        &self,
        placement: impl Into<Placement>,
        rewarded: bool,
        listeners: ShowListeners,
        policy: WaitPolicy,
    ) -> Result<ShowTicket> {
        let placement = placement.into();
        self.wait_until_ready(&placement, policy).await?;
        tracing::info!("Ads for {} are available and ready.", placement);
        self.show(placement, rewarded, listeners)
    }

    // ------------------------------------------------------------------
    // Task ownership
    // ------------------------------------------------------------------

    /// Run `task` as part of this session. It is aborted by
    /// [`AdSession::teardown`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F>(&self, task: F) -> AbortHandle
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task)
    }

    /// Number of session tasks that have not finished yet.
    pub fn pending_tasks(&self) -> usize {
        let mut tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Stop every pending wait and outcome relay owned by this session.
    ///
    /// State is left as it is; a session torn down mid-initialization stays
    /// `Initializing`.
    pub fn teardown(&self) {
        let mut tasks = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let pending = tasks.len();
        tasks.abort_all();
        tracing::info!("Ad session torn down, {} pending task(s) cancelled", pending);
    }
}

fn log_outcome(outcome: ShowOutcome) {
    match outcome {
        ShowOutcome::Finished => tracing::info!("The ad was successfully shown."),
        ShowOutcome::Skipped => tracing::warn!("The ad was skipped before reaching the end."),
        ShowOutcome::Failed => tracing::error!("The ad failed to be shown."),
    }
}

fn ensure_runtime() -> Result<()> {
    Handle::try_current().map(|_| ()).map_err(|_| {
        tracing::error!("Ad session calls must run inside a tokio runtime.");
        AdsError::NoAsyncRuntime
    })
}

fn upgrade(inner: &Weak<Inner>) -> Option<AdSession> {
    inner.upgrade().map(|inner| AdSession { inner })
}

/// Builder for [`AdSession`].
pub struct SessionBuilder {
    config: SessionConfig,
    provider: Option<Arc<dyn AdProvider>>,
    gamer_sid: Option<String>,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            provider: None,
            gamer_sid: None,
        }
    }

    /// Override session configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settings(mut self, settings: AdsSettings) -> Self {
        self.config.settings = settings;
        self
    }

    pub fn init_watch(mut self, policy: WaitPolicy) -> Self {
        self.config.init_watch = policy;
        self
    }

    pub fn provider(mut self, provider: impl AdProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn AdProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn gamer_sid(mut self, sid: impl Into<String>) -> Self {
        self.gamer_sid = Some(sid.into());
        self
    }

    /// Build the session. Without a provider the session runs on
    /// [`UnsupportedAdProvider`](crate::providers::UnsupportedAdProvider).
    pub fn build(self) -> AdSession {
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(crate::providers::UnsupportedAdProvider));
        let session = AdSession::with_config(provider, self.config);
        session.set_gamer_sid(self.gamer_sid.as_deref());
        session
    }
}
