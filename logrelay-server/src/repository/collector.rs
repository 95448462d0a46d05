//! Event collector repository
//!
//! Outbound batch client: entries are queued with `send` and transmitted
//! together by one explicit `flush`.

use async_trait::async_trait;
use logrelay_client::{ClientError, CollectorClient};
use logrelay_core::domain::log::LogEntry;

/// Repository trait for the log collection backend
#[async_trait]
pub trait EventCollector: Send + Sync {
    /// Queues one entry for the next flush
    fn send(&self, entry: &LogEntry);

    /// Transmits everything queued, returning the backend's raw response
    async fn flush(&self) -> Result<String, ClientError>;
}

#[async_trait]
impl EventCollector for CollectorClient {
    fn send(&self, entry: &LogEntry) {
        CollectorClient::send(self, entry);
    }

    async fn flush(&self) -> Result<String, ClientError> {
        CollectorClient::flush(self).await
    }
}
