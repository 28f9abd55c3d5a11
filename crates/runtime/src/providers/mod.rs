//! Ad provider adapters shipped with the runtime.

pub mod simulated;
pub mod unsupported;

pub use simulated::{InitializeCall, ShowCall, SimulatedAdProvider, SimulatedAdProviderBuilder};
pub use unsupported::UnsupportedAdProvider;
