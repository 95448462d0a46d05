//! Meta API Handler

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

/// GET /meta
/// Describes the running build
pub async fn get_meta() -> Json<Meta> {
    Json(Meta {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
    })
}
