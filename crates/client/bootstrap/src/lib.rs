//! Shared bootstrap utilities for ad session hosts.
//!
//! Provides configuration loading, provider selection, and session assembly
//! that can be reused by the demo binary or any embedding game.
pub mod builder;
pub mod config;
pub mod providers;

pub use builder::{AdsBuilder, AdsSetup};
pub use config::{AdsConfig, ProviderChoice};
pub use providers::{ProviderFactory, SimulatedProviderFactory};
