//! Unified error types surfaced by the ad session API.
//!
//! Every variant is non-fatal: the session logs the rejection where it happens
//! and hands the error back so callers can decide whether to retry.
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::Placement;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, AdsError>;

#[derive(Debug, Error)]
pub enum AdsError {
    #[error("ads are not supported on the current platform")]
    NotSupported,

    #[error("a valid game id is required to initialize ads")]
    NotConfigured,

    #[error("ads are already being initialized")]
    AlreadyInitializing,

    #[error("ads are already initialized")]
    AlreadyInitialized,

    #[error("ads are not initialized")]
    NotInitialized,

    #[error("ad placement {placement} is not ready")]
    NotReady { placement: Placement },

    #[error("reward cooldown for {key} is active until {until}")]
    CooldownActive { key: String, until: DateTime<Utc> },

    #[error("ads failed to initialize within {waited:?}; no ad for {placement} will be shown")]
    InitTimeout {
        placement: Placement,
        waited: Duration,
    },

    #[error("ad placement {placement} was not ready within {waited:?}")]
    ShowTimeout {
        placement: Placement,
        waited: Duration,
    },

    #[error("ad provider dropped the show request without reporting an outcome")]
    OutcomeDropped,

    #[error("ad session was torn down")]
    SessionClosed,

    #[error("ad session must be driven from within a tokio runtime")]
    NoAsyncRuntime,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to grant reward: {0}")]
    Reward(String),
}

/// Which half of a show-on-load wait gave up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WaitPhase {
    Initialization,
    Readiness,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WaitPhase::Initialization => "initialization",
            WaitPhase::Readiness => "readiness",
        };
        write!(f, "{}", label)
    }
}
