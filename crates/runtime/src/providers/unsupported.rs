//! Provider for platforms the ad SDK does not run on.

use crate::api::{AdProvider, OutcomeSink};
use crate::types::{Placement, ShowOptions, ShowOutcome};

/// Reports itself unsupported and never becomes ready.
///
/// Useful as the default on desktop and web builds so callers can keep the
/// same code path everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedAdProvider;

impl AdProvider for UnsupportedAdProvider {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn initialize(&self, _game_id: &str, _test_mode: bool) {
        tracing::error!("Failed to initialize ads. Current build platform is not supported.");
    }

    fn is_ready(&self, _placement: &Placement) -> bool {
        false
    }

    fn show(&self, placement: &Placement, _options: ShowOptions, sink: OutcomeSink) {
        tracing::error!(
            "Failed to show ad for {}. Ads do not support the current build platform.",
            placement
        );
        sink.deliver(ShowOutcome::Failed);
    }
}
