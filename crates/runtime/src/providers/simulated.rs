//! Scripted provider that imitates SDK timing on the tokio clock.
//!
//! Initialization and ad availability complete after configurable delays, and
//! every call is recorded so tests can assert on what the session asked for.
//! Under a paused tokio clock the delays cost no real time.
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::api::{AdProvider, OutcomeSink};
use crate::types::{DebugLevel, Placement, ShowOptions, ShowOutcome};

/// One recorded `initialize` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeCall {
    pub game_id: String,
    pub test_mode: bool,
}

/// One recorded `show` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowCall {
    pub placement: Placement,
    pub options: ShowOptions,
}

/// When a placement becomes available after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    After(Duration),
    Never,
}

#[derive(Debug, Clone)]
struct Script {
    supported: bool,
    init_delay: Option<Duration>,
    default_availability: Availability,
    placements: HashMap<Placement, Availability>,
    outcome: ShowOutcome,
    outcome_delay: Duration,
    drop_outcomes: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            supported: true,
            init_delay: Some(Duration::ZERO),
            default_availability: Availability::After(Duration::ZERO),
            placements: HashMap::new(),
            outcome: ShowOutcome::Finished,
            outcome_delay: Duration::from_millis(100),
            drop_outcomes: false,
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    initialize_requested_at: Option<Instant>,
    initialize_calls: Vec<InitializeCall>,
    show_calls: Vec<ShowCall>,
    ready_checks: u32,
    queued_outcomes: VecDeque<ShowOutcome>,
    showing: bool,
    debug_level: Option<DebugLevel>,
}

/// Simulated ad SDK. Clones share recorded state.
#[derive(Debug, Clone)]
pub struct SimulatedAdProvider {
    script: Arc<Script>,
    recorded: Arc<Mutex<Recorded>>,
}

impl SimulatedAdProvider {
    /// A supported provider that initializes and fills every placement
    /// immediately and reports [`ShowOutcome::Finished`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SimulatedAdProviderBuilder {
        SimulatedAdProviderBuilder::default()
    }

    /// Queue an outcome for the next show, overriding the scripted default once.
    pub fn push_outcome(&self, outcome: ShowOutcome) {
        self.recorded().queued_outcomes.push_back(outcome);
    }

    pub fn initialize_calls(&self) -> Vec<InitializeCall> {
        self.recorded().initialize_calls.clone()
    }

    pub fn show_calls(&self) -> Vec<ShowCall> {
        self.recorded().show_calls.clone()
    }

    /// Number of `is_ready` samples taken so far.
    pub fn ready_checks(&self) -> u32 {
        self.recorded().ready_checks
    }

    pub fn debug_level(&self) -> Option<DebugLevel> {
        self.recorded().debug_level
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn initialized_at(&self) -> Option<Instant> {
        let requested = self.recorded().initialize_requested_at?;
        self.script.init_delay.map(|delay| requested + delay)
    }

    fn availability(&self, placement: &Placement) -> Availability {
        self.script
            .placements
            .get(placement)
            .copied()
            .unwrap_or(self.script.default_availability)
    }
}

impl Default for SimulatedAdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AdProvider for SimulatedAdProvider {
    fn is_supported(&self) -> bool {
        self.script.supported
    }

    fn is_initialized(&self) -> bool {
        self.initialized_at()
            .is_some_and(|at| Instant::now() >= at)
    }

    fn initialize(&self, game_id: &str, test_mode: bool) {
        let mut recorded = self.recorded();
        recorded.initialize_calls.push(InitializeCall {
            game_id: game_id.to_owned(),
            test_mode,
        });
        if self.script.supported && recorded.initialize_requested_at.is_none() {
            recorded.initialize_requested_at = Some(Instant::now());
        }
    }

    fn is_ready(&self, placement: &Placement) -> bool {
        self.recorded().ready_checks += 1;

        let Some(initialized_at) = self.initialized_at() else {
            return false;
        };
        match self.availability(placement) {
            Availability::After(delay) => Instant::now() >= initialized_at + delay,
            Availability::Never => false,
        }
    }

    fn show(&self, placement: &Placement, options: ShowOptions, sink: OutcomeSink) {
        let outcome = {
            let mut recorded = self.recorded();
            recorded.show_calls.push(ShowCall {
                placement: placement.clone(),
                options,
            });
            recorded.showing = true;
            recorded
                .queued_outcomes
                .pop_front()
                .unwrap_or(self.script.outcome)
        };

        let recorded = Arc::clone(&self.recorded);
        let delay = self.script.outcome_delay;
        let drop_outcome = self.script.drop_outcomes;

        tokio::spawn(async move {
            sleep(delay).await;
            recorded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .showing = false;
            if drop_outcome {
                drop(sink);
            } else {
                sink.deliver(outcome);
            }
        });
    }

    fn is_showing(&self) -> bool {
        self.recorded().showing
    }

    fn set_debug_level(&self, level: DebugLevel) {
        self.recorded().debug_level = Some(level);
    }
}

/// Builder for [`SimulatedAdProvider`].
#[derive(Debug, Default)]
pub struct SimulatedAdProviderBuilder {
    script: Script,
}

impl SimulatedAdProviderBuilder {
    /// Report the platform as unsupported.
    pub fn unsupported(mut self) -> Self {
        self.script.supported = false;
        self
    }

    /// Finish initializing `delay` after `initialize` is called.
    pub fn initialized_after(mut self, delay: Duration) -> Self {
        self.script.init_delay = Some(delay);
        self
    }

    /// Never finish initializing.
    pub fn never_initializes(mut self) -> Self {
        self.script.init_delay = None;
        self
    }

    /// Fill every placement `delay` after initialization completes.
    pub fn ready_after(mut self, delay: Duration) -> Self {
        self.script.default_availability = Availability::After(delay);
        self
    }

    /// Override the fill delay for one placement.
    pub fn placement_ready_after(mut self, placement: impl Into<Placement>, delay: Duration) -> Self {
        self.script
            .placements
            .insert(placement.into(), Availability::After(delay));
        self
    }

    /// Never fill `placement`.
    pub fn never_ready(mut self, placement: impl Into<Placement>) -> Self {
        self.script
            .placements
            .insert(placement.into(), Availability::Never);
        self
    }

    /// Never fill any placement without an explicit override.
    pub fn never_ready_by_default(mut self) -> Self {
        self.script.default_availability = Availability::Never;
        self
    }

    /// Outcome reported for every show unless one is queued.
    pub fn outcome(mut self, outcome: ShowOutcome) -> Self {
        self.script.outcome = outcome;
        self
    }

    /// How long an ad "plays" before its outcome is reported.
    pub fn outcome_after(mut self, delay: Duration) -> Self {
        self.script.outcome_delay = delay;
        self
    }

    /// Drop every outcome sink unreported, imitating a misbehaving SDK.
    pub fn drop_outcomes(mut self) -> Self {
        self.script.drop_outcomes = true;
        self
    }

    pub fn build(self) -> SimulatedAdProvider {
        SimulatedAdProvider {
            script: Arc::new(self.script),
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }
}
