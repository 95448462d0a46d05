//! Splunk HTTP Event Collector (HEC) client
//!
//! Events are queued locally with [`CollectorClient::send`] and transmitted
//! in a single request by [`CollectorClient::flush`]. Nothing is sent
//! automatically; the caller decides when a batch is complete.

use logrelay_core::domain::log::LogEntry;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::handle_text_response;

/// Default HEC timeout.
const HEC_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the collector
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Scheme and host (e.g. "https://splunk.example.com")
    pub url: String,
    pub port: u16,
    /// Collector path (e.g. "/services/collector/event/1.0")
    pub path: String,
    pub token: String,
}

/// Manual-flush HEC client
#[derive(Debug)]
pub struct CollectorClient {
    settings: CollectorSettings,
    client: Client,
    queue: Mutex<Vec<Value>>,
}

impl CollectorClient {
    pub fn new(settings: CollectorSettings) -> Self {
        let client = Client::builder()
            .timeout(HEC_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self::with_client(settings, client)
    }

    /// Create a collector client with a custom HTTP client
    pub fn with_client(settings: CollectorSettings, client: Client) -> Self {
        Self {
            settings,
            client,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Full collector endpoint URL
    pub fn endpoint_url(&self) -> String {
        let path = if self.settings.path.starts_with('/') {
            self.settings.path.clone()
        } else {
            format!("/{}", self.settings.path)
        };

        format!(
            "{}:{}{}",
            self.settings.url.trim_end_matches('/'),
            self.settings.port,
            path
        )
    }

    /// Queue one log entry for the next flush
    pub fn send(&self, entry: &LogEntry) {
        let event = json!({ "event": { "message": entry.as_value() } });
        self.lock_queue().push(event);
    }

    /// Number of events waiting for the next flush
    pub fn queued(&self) -> usize {
        self.lock_queue().len()
    }

    /// Transmit every queued event in one request
    ///
    /// The queue is emptied before the request goes out, so a failed flush
    /// drops its events; the caller still holds the entries and owns the
    /// decision to resend. Returns the raw response body.
    pub async fn flush(&self) -> Result<String> {
        let events: Vec<Value> = std::mem::take(&mut *self.lock_queue());

        if events.is_empty() {
            debug!("Nothing queued, skipping flush");
            return Ok(String::new());
        }

        let body = events
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        debug!("Flushing {} events to {}", events.len(), self.endpoint_url());

        let response = self
            .client
            .post(self.endpoint_url())
            .header("Authorization", format!("Splunk {}", self.settings.token))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        handle_text_response(response).await
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
