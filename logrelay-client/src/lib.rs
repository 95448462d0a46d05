//! logrelay HTTP Clients
//!
//! Typed reqwest clients for the three remote systems the relay talks to:
//! - [`IdentityClient`]: Auth0 Management API (client-credentials token, tenant logs)
//! - [`CollectorClient`]: Splunk HTTP Event Collector with a manual-flush queue
//! - [`SlackClient`]: Slack incoming webhook
//!
//! # Example
//!
//! ```no_run
//! use logrelay_client::{CollectorClient, CollectorSettings};
//! use logrelay_core::domain::log::LogEntry;
//!
//! # async fn example() -> logrelay_client::Result<()> {
//! let collector = CollectorClient::new(CollectorSettings {
//!     url: "https://splunk.example.com".to_string(),
//!     port: 8088,
//!     path: "/services/collector/event/1.0".to_string(),
//!     token: "hec-token".to_string(),
//! });
//!
//! collector.send(&LogEntry::new(serde_json::json!({ "log_id": "1" })));
//! let body = collector.flush().await?;
//! println!("Splunk said: {}", body);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod collector;
pub mod error;
pub mod identity;

pub use chat::{SlackAttachment, SlackClient, SlackField, SlackMessage};
pub use collector::{CollectorClient, CollectorSettings};
pub use error::{ClientError, Result};
pub use identity::{IdentityClient, IdentitySettings};

use serde::de::DeserializeOwned;

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize a JSON body
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Check the status code and return the raw body text
async fn handle_text_response(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());

    if !status.is_success() {
        return Err(ClientError::api_error(status.as_u16(), body));
    }

    Ok(body)
}
