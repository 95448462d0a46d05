//! Core domain types
//!
//! These types describe what flows through one relay cycle: the opaque log
//! entries pulled from the identity provider, the checkpoint marking how far
//! retrieval has advanced, and the status/report objects handed to the
//! notifier and returned to the caller.

pub mod checkpoint;
pub mod log;
pub mod report;
pub mod run;
