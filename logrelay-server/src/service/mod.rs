//! Service Module
//!
//! Business logic layer for the relay.
//! Services orchestrate between repositories and contain domain logic.

pub mod filter;
pub mod forwarder;
pub mod notifier;
pub mod relay;
pub mod report;
pub mod scheduled;

#[cfg(test)]
pub(crate) mod testing;

// Re-export for convenience
pub use relay::{LogRelay, RunError};
pub use scheduled::{Collaborators, ScheduledRun};
