//! Timeout-bounded polling used while waiting for the SDK.
//!
//! The SDK offers no completion signal for initialization or ad loading, so
//! the session samples a condition on a fixed interval. Sampling yields to the
//! tokio timer between checks; dropping or aborting the future stops it.
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// How often to sample and how long to keep trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    /// `None` or zero waits indefinitely.
    pub timeout: Option<Duration>,
}

impl WaitPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

    pub const fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    /// Sample forever at the default interval.
    pub const fn indefinite() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, None)
    }

    /// Sample at the default interval until `timeout` elapses.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Some(timeout))
    }

    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Effective timeout, treating zero as "no timeout".
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(15))
    }
}

/// The condition did not hold before the policy's timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTimedOut {
    pub waited: Duration,
    pub samples: u32,
}

/// Sample `condition` until it holds or the policy times out.
///
/// The condition is checked before the timeout on every sample, so a
/// condition that becomes true exactly at the deadline still succeeds.
/// Returns the time spent waiting.
pub async fn poll_until<F>(
    policy: WaitPolicy,
    mut condition: F,
) -> std::result::Result<Duration, WaitTimedOut>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let deadline = policy.deadline();
    let mut samples = 0u32;

    loop {
        samples += 1;
        if condition() {
            return Ok(start.elapsed());
        }

        let waited = start.elapsed();
        if let Some(timeout) = deadline
            && waited >= timeout
        {
            return Err(WaitTimedOut { waited, samples });
        }

        sleep(policy.interval).await;
    }
}
