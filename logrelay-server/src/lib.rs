//! Log relay server
//!
//! Pulls tenant logs from the identity provider, forwards them to a Splunk
//! HTTP Event Collector, and reports progress to chat.

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
