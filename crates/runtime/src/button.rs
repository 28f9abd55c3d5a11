//! Headless "watch ad" button.
//!
//! Holds the placement and reusable callbacks a UI button would carry. The
//! host polls [`AdButton::is_interactable`] each frame to enable the widget
//! and calls [`AdButton::press`] on click.
use std::sync::Arc;

use crate::api::Result;
use crate::listeners::{ShowListeners, ShowTicket};
use crate::session::AdSession;
use crate::types::Placement;

type Action = Arc<dyn Fn() + Send + Sync + 'static>;

pub struct AdButton {
    session: AdSession,
    placement: Placement,
    rewarded: bool,
    on_finished: Option<Action>,
    on_skipped: Option<Action>,
    on_failed: Option<Action>,
}

impl AdButton {
    pub fn new(session: AdSession, placement: impl Into<Placement>) -> Self {
        Self {
            session,
            placement: placement.into(),
            rewarded: false,
            on_finished: None,
            on_skipped: None,
            on_failed: None,
        }
    }

    pub fn rewarded(mut self, rewarded: bool) -> Self {
        self.rewarded = rewarded;
        self
    }

    pub fn on_finished(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_finished = Some(Arc::new(f));
        self
    }

    pub fn on_skipped(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_skipped = Some(Arc::new(f));
        self
    }

    pub fn on_failed(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_failed = Some(Arc::new(f));
        self
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn is_interactable(&self) -> bool {
        self.session.is_ready(&self.placement)
    }

    /// Install this button's callbacks for one show and show the ad.
    pub fn press(&self) -> Result<ShowTicket> {
        self.session
            .show(self.placement.clone(), self.rewarded, self.listeners())
    }

    fn listeners(&self) -> ShowListeners {
        let mut listeners = ShowListeners::new();
        if let Some(action) = self.on_finished.clone() {
            listeners = listeners.on_finished(move || action());
        }
        if let Some(action) = self.on_skipped.clone() {
            listeners = listeners.on_skipped(move || action());
        }
        if let Some(action) = self.on_failed.clone() {
            listeners = listeners.on_failed(move || action());
        }
        listeners
    }
}
