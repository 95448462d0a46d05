//! API Module
//!
//! HTTP API layer for the relay.
//! Scheduled invocations are intercepted by the gate middleware before
//! routing; everything else reaches the routes below.

pub mod error;
pub mod gate;
pub mod health;
pub mod meta;

use axum::{Router, http::StatusCode, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::ScheduledRun;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub scheduled: Arc<ScheduledRun>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/meta", get(meta::get_meta))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::scheduled_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
