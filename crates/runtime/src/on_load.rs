//! Show an ad as soon as a scene loads.
//!
//! Initializes the session if needed, waits for initialization and then for
//! the placement to fill, each under its own timeout, and shows the ad once.
//! Spawned on the session so tearing the session down stops the waits.
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::api::{AdsError, Result};
use crate::listeners::ShowListeners;
use crate::session::AdSession;
use crate::types::{Placement, ShowOutcome};
use crate::wait::WaitPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowOnLoad {
    pub placement: Placement,
    pub rewarded: bool,
    pub init_wait: WaitPolicy,
    pub ready_wait: WaitPolicy,
}

impl ShowOnLoad {
    /// Default placement, 15 s for each phase, sampled every 0.5 s.
    pub fn new(placement: impl Into<Placement>) -> Self {
        Self {
            placement: placement.into(),
            rewarded: false,
            init_wait: WaitPolicy::default(),
            ready_wait: WaitPolicy::default(),
        }
    }

    pub fn rewarded(mut self, rewarded: bool) -> Self {
        self.rewarded = rewarded;
        self
    }

    /// Timeout for initialization; `None` or zero waits indefinitely.
    pub fn init_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.init_wait.timeout = timeout;
        self
    }

    /// Timeout for the placement to fill; `None` or zero waits indefinitely.
    pub fn show_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_wait.timeout = timeout;
        self
    }

    /// Sampling interval for both phases.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.init_wait.interval = interval;
        self.ready_wait.interval = interval;
        self
    }

    /// Run the flow to completion and return the show outcome.
    pub async fn run(self, session: &AdSession, listeners: ShowListeners) -> Result<ShowOutcome> {
        if !session.is_supported() {
            tracing::debug!("Skipping ad on load for {}: ads not supported", self.placement);
            return Err(AdsError::NotSupported);
        }

        if !session.is_initialized() {
            match session.initialize() {
                Ok(()) | Err(AdsError::AlreadyInitializing) | Err(AdsError::AlreadyInitialized) => {}
                Err(e) => return Err(e),
            }
        }

        session
            .wait_until_initialized(&self.placement, self.init_wait)
            .await?;
        tracing::info!("Ads have finished initializing. Waiting for ads to be ready...");

        let ticket = session
            .show_when_ready(self.placement, self.rewarded, listeners, self.ready_wait)
            .await?;

        ticket.await
    }

    /// Run the flow as a session task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self, session: &AdSession, listeners: ShowListeners) -> AbortHandle {
        let owner = session.clone();
        session.spawn(async move {
            let placement = self.placement.clone();
            match self.run(&owner, listeners).await {
                Ok(outcome) => tracing::debug!("Ad on load for {} {}", placement, outcome),
                Err(e) => tracing::debug!("Ad on load for {} not shown: {}", placement, e),
            }
        })
    }
}
