//! Capability boundary to the underlying ad SDK.
//!
//! The session never talks to an SDK directly. Runtime users plug in an
//! [`AdProvider`] so the same controller drives a real SDK binding, a no-op
//! adapter for unsupported platforms, or a scripted test double.
use tokio::sync::oneshot;

use crate::types::{DebugLevel, Placement, ShowOptions, ShowOutcome};

/// Trait for the narrow set of operations the session needs from an ad SDK.
///
/// Implementations must be cheap to poll: `is_initialized` and `is_ready` are
/// sampled repeatedly while the session waits.
pub trait AdProvider: Send + Sync {
    /// Whether the SDK can run on the current platform at all.
    fn is_supported(&self) -> bool;

    /// Whether the SDK has finished initializing.
    fn is_initialized(&self) -> bool;

    /// Request initialization. Fire-and-forget; progress is observed through
    /// [`AdProvider::is_initialized`].
    fn initialize(&self, game_id: &str, test_mode: bool);

    /// Whether an ad can be shown for the placement right now.
    fn is_ready(&self, placement: &Placement) -> bool;

    /// Show an ad for a placement that was just reported ready.
    ///
    /// The provider must report exactly one outcome through `sink`, even when
    /// it fails immediately. Dropping the sink unreported is observed by the
    /// session as [`ShowOutcome::Failed`].
    fn show(&self, placement: &Placement, options: ShowOptions, sink: OutcomeSink);

    /// Whether an ad is currently on screen.
    fn is_showing(&self) -> bool {
        false
    }

    /// Forward log verbosity to the SDK's own logger.
    fn set_debug_level(&self, _level: DebugLevel) {}
}

/// Single-use channel for reporting the outcome of one show request.
#[derive(Debug)]
pub struct OutcomeSink {
    tx: oneshot::Sender<ShowOutcome>,
}

impl OutcomeSink {
    /// Create a sink and the receiver the session awaits.
    pub fn channel() -> (Self, oneshot::Receiver<ShowOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report the outcome. Consumes the sink so it can only happen once.
    pub fn deliver(self, outcome: ShowOutcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("Show outcome {} delivered after the session went away", outcome);
        }
    }
}
