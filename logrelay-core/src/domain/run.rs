//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::checkpoint::Checkpoint;

/// Structured error attached to a run status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Human readable summary (e.g. "Error sending logs to Splunk")
    pub message: String,
    /// Underlying cause, rendered as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            message: message.into(),
            error: Some(cause.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

/// Aggregate status of one fetch-and-forward cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    pub logs_processed: u64,
    #[serde(default)]
    pub checkpoint: Option<Checkpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RunStatus {
    /// Fresh status for a run starting now
    pub fn started(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            logs_processed: 0,
            checkpoint: None,
            error: None,
            warning: None,
        }
    }

    /// Synthetic zero-progress status reported when a run fails outright
    pub fn failed(error: ErrorInfo) -> Self {
        let now = Utc::now();
        Self {
            start: now,
            end: Some(now),
            logs_processed: 0,
            checkpoint: None,
            error: Some(error),
            warning: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of one invocation, returned to the caller as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub checkpoint: Option<Checkpoint>,
}
