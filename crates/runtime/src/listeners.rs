//! Per-show callbacks and the single-shot outcome future.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::api::{AdsError, Result};
use crate::types::{Placement, ShowOutcome};

type Listener = Box<dyn FnOnce() + Send + 'static>;

/// One optional callback per outcome kind.
///
/// A set is installed by each [`AdSession::show`](crate::AdSession::show)
/// call, replacing any set still waiting, and is consumed by the next outcome
/// whether or not it has a callback for that outcome.
#[derive(Default)]
pub struct ShowListeners {
    on_finished: Option<Listener>,
    on_skipped: Option<Listener>,
    on_failed: Option<Listener>,
}

impl ShowListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the ad played to the end. Reward the user here.
    pub fn on_finished(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_finished = Some(Box::new(f));
        self
    }

    /// Called when the ad was skipped. The user should not be rewarded.
    pub fn on_skipped(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_skipped = Some(Box::new(f));
        self
    }

    /// Called when the ad could not be shown.
    pub fn on_failed(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_failed = Some(Box::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_finished.is_none() && self.on_skipped.is_none() && self.on_failed.is_none()
    }

    /// Consume the set, keeping only the callback for `outcome`.
    pub(crate) fn into_listener(self, outcome: ShowOutcome) -> Option<Listener> {
        match outcome {
            ShowOutcome::Finished => self.on_finished,
            ShowOutcome::Skipped => self.on_skipped,
            ShowOutcome::Failed => self.on_failed,
        }
    }
}

impl fmt::Debug for ShowListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShowListeners")
            .field("on_finished", &self.on_finished.is_some())
            .field("on_skipped", &self.on_skipped.is_some())
            .field("on_failed", &self.on_failed.is_some())
            .finish()
    }
}

/// Resolves to the outcome of exactly one accepted show request.
///
/// Fails with [`AdsError::SessionClosed`] if the session is torn down before
/// the provider reports.
#[derive(Debug)]
pub struct ShowTicket {
    placement: Placement,
    rx: oneshot::Receiver<ShowOutcome>,
}

impl ShowTicket {
    pub(crate) fn new(placement: Placement, rx: oneshot::Receiver<ShowOutcome>) -> Self {
        Self { placement, rx }
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }
}

impl Future for ShowTicket {
    type Output = Result<ShowOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| AdsError::SessionClosed))
    }
}
