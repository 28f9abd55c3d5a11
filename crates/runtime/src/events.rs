//! Broadcast bus for session notifications.
//!
//! Events are best-effort: publishing with no subscribers is normal and a
//! lagging subscriber only loses its own backlog.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::WaitPhase;
use crate::types::{InitializationState, Placement, ShowOutcome};

/// Notifications published by the session and reward gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdEvent {
    StateChanged {
        from: InitializationState,
        to: InitializationState,
    },
    ShowStarted {
        placement: Placement,
        rewarded: bool,
    },
    ShowCompleted {
        placement: Placement,
        outcome: ShowOutcome,
    },
    WaitAbandoned {
        placement: Placement,
        phase: WaitPhase,
    },
    CooldownUpdated {
        key: String,
        until: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AdEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: AdEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for ad event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
