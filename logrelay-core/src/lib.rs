//! logrelay Core
//!
//! Core types shared by the logrelay client and server crates.
//!
//! This crate contains:
//! - Domain types: checkpoints, log entries, run status and reports
//! - Invocation: inbound trigger metadata and the scheduled-run classifier

pub mod domain;
pub mod invocation;
