//! Public runtime API surface.
//!
//! Gathers the error taxonomy and the provider contract so the session,
//! reward gate, and adapters share one vocabulary.

pub mod errors;
pub mod provider;

pub use errors::{AdsError, Result, WaitPhase};
pub use provider::{AdProvider, OutcomeSink};
