//! Log forwarder service
//!
//! Hands one batch of log entries to the collector: queue every entry, then
//! flush once. A failed flush is reported back as a value so the caller can
//! finish its run bookkeeping.

use logrelay_core::domain::log::LogEntry;
use logrelay_core::domain::run::ErrorInfo;
use std::sync::Arc;
use tracing::info;

use crate::repository::EventCollector;

/// Summary attached to every forwarding failure
pub const FORWARD_ERROR_MESSAGE: &str = "Error sending logs to Splunk";

/// A batch that could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ForwardFailure(pub ErrorInfo);

impl ForwardFailure {
    pub fn into_error_info(self) -> ErrorInfo {
        self.0
    }
}

/// Forwards batches of log entries to the collector
pub struct LogForwarder {
    collector: Arc<dyn EventCollector>,
}

impl LogForwarder {
    pub fn new(collector: Arc<dyn EventCollector>) -> Self {
        Self { collector }
    }

    /// Delivers one batch with a single flush
    ///
    /// An empty batch succeeds without touching the collector.
    pub async fn forward(&self, entries: &[LogEntry]) -> Result<(), ForwardFailure> {
        if entries.is_empty() {
            return Ok(());
        }

        for entry in entries {
            self.collector.send(entry);
        }

        info!("Sending {} logs to Splunk...", entries.len());

        match self.collector.flush().await {
            Ok(body) => {
                info!("Splunk response: {}", body);
                info!("Upload complete.");
                Ok(())
            }
            Err(e) => {
                info!("Splunk response: {}", e);
                Err(ForwardFailure(ErrorInfo::with_cause(FORWARD_ERROR_MESSAGE, e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{MockCollector, entries};

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let collector = Arc::new(MockCollector::default());
        let forwarder = LogForwarder::new(collector.clone());

        assert!(forwarder.forward(&[]).await.is_ok());
        assert_eq!(collector.sent().len(), 0);
        assert_eq!(collector.flushes(), 0);
    }

    #[tokio::test]
    async fn test_batch_is_queued_then_flushed_once() {
        let collector = Arc::new(MockCollector::default());
        let forwarder = LogForwarder::new(collector.clone());

        forwarder.forward(&entries(&["a", "b"])).await.unwrap();

        let sent = collector.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].id(), Some("a"));
        assert_eq!(sent[1].id(), Some("b"));
        assert_eq!(collector.flushes(), 1);
    }

    #[tokio::test]
    async fn test_flush_failure_is_returned_as_value() {
        let collector = Arc::new(MockCollector::failing());
        let forwarder = LogForwarder::new(collector.clone());

        let failure = forwarder.forward(&entries(&["a"])).await.unwrap_err();
        let info = failure.into_error_info();

        assert_eq!(info.message, FORWARD_ERROR_MESSAGE);
        assert!(info.error.unwrap().contains("503"));
        assert_eq!(collector.flushes(), 1);
    }
}
