//! Helpers for constructing the ad provider handed to the session.
use std::sync::Arc;
use std::time::Duration;

use ads_runtime::{AdProvider, SimulatedAdProvider, UnsupportedAdProvider};

use crate::config::ProviderChoice;

pub trait ProviderFactory: Send + Sync {
    fn build(&self) -> Arc<dyn AdProvider>;
}

/// Provider factory producing a [`SimulatedAdProvider`] with SDK-like
/// delays.
#[derive(Clone, Debug)]
pub struct SimulatedProviderFactory {
    init_delay: Duration,
    ready_delay: Duration,
}

impl SimulatedProviderFactory {
    pub fn new(init_delay: Duration, ready_delay: Duration) -> Self {
        Self {
            init_delay,
            ready_delay,
        }
    }
}

impl Default for SimulatedProviderFactory {
    fn default() -> Self {
        Self::new(Duration::from_millis(800), Duration::from_millis(1200))
    }
}

impl ProviderFactory for SimulatedProviderFactory {
    fn build(&self) -> Arc<dyn AdProvider> {
        Arc::new(
            SimulatedAdProvider::builder()
                .initialized_after(self.init_delay)
                .ready_after(self.ready_delay)
                .build(),
        )
    }
}

/// Provider factory for platforms without ad support.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedProviderFactory;

impl ProviderFactory for UnsupportedProviderFactory {
    fn build(&self) -> Arc<dyn AdProvider> {
        Arc::new(UnsupportedAdProvider)
    }
}

pub(crate) fn factory_for(choice: ProviderChoice) -> Arc<dyn ProviderFactory> {
    match choice {
        ProviderChoice::Simulated => Arc::new(SimulatedProviderFactory::default()),
        ProviderChoice::Unsupported => Arc::new(UnsupportedProviderFactory),
    }
}
