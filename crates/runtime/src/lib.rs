//! Host-agnostic ad session runtime.
//!
//! This crate wraps a third-party ad SDK behind the [`AdProvider`] port and
//! drives it through a small state machine. Consumers build an [`AdSession`]
//! to initialize the SDK, wait for placements to fill, and show ads, and a
//! [`RewardGate`] to limit rewarded placements with a persistent cooldown.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the controller and its builder
//! - [`api`] exposes the error taxonomy and the provider contract
//! - [`reward`] and [`repository`] implement the cooldown-gated rewards
//! - [`wait`] provides the timeout-bounded polling used while the SDK loads
//! - [`providers`] ships adapters for unsupported platforms and simulation
pub mod api;
pub mod button;
pub mod clock;
pub mod events;
pub mod listeners;
pub mod on_load;
pub mod providers;
pub mod repository;
pub mod reward;
pub mod session;
pub mod settings;
pub mod types;
pub mod wait;

pub use api::{AdProvider, AdsError, OutcomeSink, Result, WaitPhase};
pub use button::AdButton;
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{AdEvent, EventBus};
pub use listeners::{ShowListeners, ShowTicket};
pub use on_load::ShowOnLoad;
pub use providers::{SimulatedAdProvider, UnsupportedAdProvider};
pub use repository::{
    CooldownStore, FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, RepositoryError,
};
pub use reward::{LogRewardGrantor, RewardGate, RewardGrantor, RewardedPlacement};
pub use session::{AdSession, SessionBuilder, SessionConfig};
pub use settings::{AdsSettings, DEFAULT_ANDROID_GAME_ID, DEFAULT_IOS_GAME_ID, LogFlags};
pub use types::{DebugLevel, InitializationState, Placement, Platform, ShowOptions, ShowOutcome};
pub use wait::{WaitPolicy, WaitTimedOut, poll_until};
