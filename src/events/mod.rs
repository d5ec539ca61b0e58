//! Event delegation - from host events to per-selector streams.
//!
//! No per-node listeners exist anywhere: the driver keeps one root listener
//! per event kind, and [`delegator`] resolves each incoming event's target
//! against the current selector index.

mod delegator;

pub use delegator::*;
